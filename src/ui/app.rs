/// Popup application shell: routing, account header and home screen

use crate::bridge::popup_bridge;
use crate::config::{DEFAULT_ASK_TIMEOUT, NetworkConfig};
use crate::format::to_short_address;
use crate::route::Route;
use crate::send::{PendingOperation, SendFlow};
use crate::storage::{self, AccountState};
use crate::ui::import::ImportPage;
use crate::ui::notification::{ConnectDapp, SwitchNetwork, Unlock};
use crate::ui::send::SendPage;
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

#[function_component(App)]
pub fn app() -> Html {
    let route = use_state(Route::current);
    let network = use_state(NetworkConfig::default);
    let account = use_state(AccountState::default);
    // Bumped on every return home so imports and unlocks show up
    let reload = use_state(|| 0u32);

    // Load selected network and its account snapshot
    {
        let network = network.clone();
        let account = account.clone();
        use_effect_with(*reload, move |_| {
            spawn_local(async move {
                let selected = match storage::load_network().await {
                    Ok(selected) => selected,
                    Err(e) => {
                        log::error!("Failed to load network: {}", e);
                        return;
                    }
                };
                network.set(selected.config());

                match storage::load_account(selected).await {
                    Ok(state) => account.set(state),
                    Err(e) => log::error!("Failed to load account: {}", e),
                }
            });
            || ()
        });
    }

    let on_navigate = {
        let route = route.clone();
        let reload = reload.clone();
        Callback::from(move |next: Route| {
            if next.shows_account() {
                reload.set(*reload + 1);
            }
            next.write_to_location();
            route.set(next);
        })
    };

    let page = match &*route {
        Route::Home => html! {
            <Home account={(*account).clone()} network={*network} on_navigate={on_navigate.clone()} />
        },
        Route::Import => html! {
            <ImportPage network={network.network} on_navigate={on_navigate.clone()} />
        },
        Route::Send(flow) => html! {
            <SendPage
                flow={flow.clone()}
                balance={account.balance.clone()}
                wallet={account.active_wallet.clone()}
                network={*network}
                on_navigate={on_navigate.clone()}
            />
        },
        Route::ConnectDapp { id, origin, logo } => html! {
            <ConnectDapp id={*id} origin={origin.clone()} logo={logo.clone()} />
        },
        Route::Unlock { id } => html! {
            <Unlock id={*id} on_navigate={on_navigate.clone()} />
        },
        Route::SwitchNetwork {
            id,
            origin,
            logo,
            network: requested,
        } => html! {
            <SwitchNetwork id={*id} origin={origin.clone()} logo={logo.clone()} network={requested.clone()} />
        },
    };

    html! {
        <div class="padding-20">
            {page}
            <p class="footer">{format!("TON Wallet v{}", env!("CARGO_PKG_VERSION"))}</p>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct HomeProps {
    account: AccountState,
    network: NetworkConfig,
    on_navigate: Callback<Route>,
}

#[function_component(Home)]
fn home(props: &HomeProps) -> Html {
    // Resume a send flow interrupted by closing the popup
    {
        let on_navigate = props.on_navigate.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                let stored = popup_bridge()
                    .ask::<Option<PendingOperation>>("getOperation", (), DEFAULT_ASK_TIMEOUT)
                    .await;
                match stored {
                    Ok(Some(operation)) => match SendFlow::from_pending_operation(&operation) {
                        Ok(flow) => {
                            log::info!("Resuming send flow at {}", flow.phase());
                            on_navigate.emit(Route::Send(flow));
                        }
                        Err(e) => log::warn!("Ignoring stored operation: {}", e),
                    },
                    Ok(None) => {}
                    Err(e) => log::error!("Failed to load operation: {}", e),
                }
            });
            || ()
        });
    }

    let go = |next: fn() -> Route| {
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |_: MouseEvent| on_navigate.emit(next()))
    };
    let on_send = go(|| Route::Send(SendFlow::default()));
    let on_import = go(|| Route::Import);

    let wallet = props
        .account
        .active_wallet
        .as_deref()
        .map(to_short_address)
        .unwrap_or_else(|| "No wallet".to_string());
    let balance = props.account.balance.clone().unwrap_or_else(|| "-".to_string());

    html! {
        <div class="flex-column-gap">
            <h1 class="popup-title">{"TON Wallet"}</h1>
            <p class="message-text">{format!("Network: {}", props.network.network)}</p>
            <p class="address">{wallet}</p>
            <h2 class="stats-title">{format!("{} TON", balance)}</h2>

            if props.account.active_wallet.is_none() {
                <Alert r#type={AlertType::Info} title={"Import a wallet to get started"} inline={true}>
                </Alert>
            }

            <Button onclick={on_send} disabled={props.account.active_wallet.is_none()} variant={ButtonVariant::Primary} block={true}>
                {"Send"}
            </Button>
            <Button onclick={on_import} variant={ButtonVariant::Secondary} block={true}>
                {"Import wallet"}
            </Button>
        </div>
    }
}
