/// Hash routes of the popup page (`index.html#/send?...`)
use crate::error::FlowError;
use crate::send::SendFlow;
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Home,
    Import,
    Send(SendFlow),
    ConnectDapp {
        id: u32,
        origin: String,
        logo: String,
    },
    /// `id` is the dApp request waiting for the unlock, if any
    Unlock {
        id: Option<u32>,
    },
    SwitchNetwork {
        id: u32,
        origin: String,
        logo: String,
        network: String,
    },
}

impl Route {
    /// Path and query as used after `#`, e.g. `/notification/unlock`
    pub fn to_path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Import => "/import".to_string(),
            Route::Send(flow) => format!("/send?{}", flow.to_query()),
            Route::ConnectDapp { id, origin, logo } => format!(
                "/notification/dapp?{}",
                encode(&[
                    ("id", id.to_string().as_str()),
                    ("origin", origin.as_str()),
                    ("logo", logo.as_str()),
                ])
            ),
            Route::Unlock { id: None } => "/notification/unlock".to_string(),
            Route::Unlock { id: Some(id) } => format!("/notification/unlock?id={}", id),
            Route::SwitchNetwork {
                id,
                origin,
                logo,
                network,
            } => format!(
                "/notification/network?{}",
                encode(&[
                    ("id", id.to_string().as_str()),
                    ("origin", origin.as_str()),
                    ("logo", logo.as_str()),
                    ("network", network.as_str()),
                ])
            ),
        }
    }

    /// Parse `#/path?query` (the leading `#` is optional)
    pub fn from_hash(hash: &str) -> Result<Route, FlowError> {
        let hash = hash.strip_prefix('#').unwrap_or(hash);
        let (path, query) = hash.split_once('?').unwrap_or((hash, ""));

        match path {
            "" | "/" => Ok(Route::Home),
            "/import" => Ok(Route::Import),
            "/send" => Ok(Route::Send(SendFlow::from_query(query)?)),
            "/notification/unlock" => {
                let mut params = Params::parse(query);
                let id = match params.take("id") {
                    id if id.is_empty() => None,
                    id => Some(id.parse().map_err(|_| FlowError::InvalidRequestId(id))?),
                };
                Ok(Route::Unlock { id })
            }
            "/notification/dapp" => {
                let mut params = Params::parse(query);
                Ok(Route::ConnectDapp {
                    id: params.id()?,
                    origin: params.take("origin"),
                    logo: params.take("logo"),
                })
            }
            "/notification/network" => {
                let mut params = Params::parse(query);
                Ok(Route::SwitchNetwork {
                    id: params.id()?,
                    origin: params.take("origin"),
                    logo: params.take("logo"),
                    network: params.take("network"),
                })
            }
            other => Err(FlowError::UnknownRoute(other.to_string())),
        }
    }

    /// Screens that read the stored account and need it fresh on arrival
    pub fn shows_account(&self) -> bool {
        matches!(self, Route::Home)
    }

    /// Route currently shown in the popup's address bar
    pub fn current() -> Route {
        let hash = web_sys::window()
            .and_then(|window| window.location().hash().ok())
            .unwrap_or_default();
        Route::from_hash(&hash).unwrap_or_else(|e| {
            log::warn!("Falling back to home: {}", e);
            Route::Home
        })
    }

    /// Persist the route into the popup's address bar
    pub fn write_to_location(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Err(e) = window.location().set_hash(&self.to_path()) {
            log::error!("Failed to update location: {:?}", e);
        }
    }
}

fn encode(pairs: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

struct Params(Vec<(String, String)>);

impl Params {
    fn parse(query: &str) -> Self {
        Params(form_urlencoded::parse(query.as_bytes()).into_owned().collect())
    }

    fn take(&mut self, key: &str) -> String {
        self.0
            .iter()
            .position(|(k, _)| k == key)
            .map(|index| self.0.swap_remove(index).1)
            .unwrap_or_default()
    }

    fn id(&mut self) -> Result<u32, FlowError> {
        let id = self.take("id");
        id.parse().map_err(|_| FlowError::InvalidRequestId(id))
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_location_round_trip() {
        let route = Route::Send(SendFlow::Pending { seqno: 12 });
        route.write_to_location();
        assert_eq!(Route::current(), route);

        Route::Home.write_to_location();
        assert_eq!(Route::current(), Route::Home);
    }
}
