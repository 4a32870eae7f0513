/// Notification popup window manager
///
/// Keeps at most one popup alive: opening again focuses the tracked window
/// instead of creating another one.
use crate::config::{POPUP_HEIGHT, POPUP_WIDTH};
use crate::error::{FlowError, WindowError};
use crate::events::{BackgroundEvent, EventEmitter};
use crate::format::from_nano;
use crate::platform::{WindowInfo, WindowOptions, WindowPlatform};
use crate::route::Route;
use crate::send::{DappRequest, SendFlow, SendState};
use std::cell::Cell;
use std::rc::Rc;

pub struct PopupManager<P: WindowPlatform> {
    platform: P,
    popup_id: Cell<Option<i32>>,
    events: Rc<EventEmitter>,
}

impl<P: WindowPlatform> PopupManager<P> {
    pub fn new(platform: P, events: Rc<EventEmitter>) -> Self {
        PopupManager {
            platform,
            popup_id: Cell::new(None),
            events,
        }
    }

    pub fn popup_id(&self) -> Option<i32> {
        self.popup_id.get()
    }

    async fn find_popup(&self) -> Result<Option<i32>, WindowError> {
        let Some(tracked) = self.popup_id.get() else {
            return Ok(None);
        };
        let windows = self.platform.get_all_windows().await?;
        Ok(windows
            .iter()
            .find(|window| window.is_popup() && window.id == Some(tracked))
            .and(Some(tracked)))
    }

    /// Focus the tracked popup or create a new one showing `page`
    pub async fn open(&self, page: &str) -> Result<i32, WindowError> {
        if let Some(id) = self.find_popup().await? {
            log::debug!("Focusing popup {}", id);
            self.platform.focus_window(id).await?;
            return Ok(id);
        }

        let last_focused = self.platform.get_last_focused_window().await?;
        let (left, top) = top_right_corner(&last_focused);

        let window = self
            .platform
            .open_window(WindowOptions {
                url: format!("index.html#{}", page),
                kind: WindowOptions::POPUP.to_string(),
                width: POPUP_WIDTH,
                height: POPUP_HEIGHT,
                left,
                top,
            })
            .await?;

        let id = window.id.ok_or(WindowError::MissingId)?;
        log::info!("Opened popup {} at {}", id, page);
        self.popup_id.set(Some(id));
        Ok(id)
    }

    /// Best-effort close; failures are only logged
    pub async fn close(&self, id: Option<i32>) {
        let Some(id) = id else {
            return;
        };
        if let Err(e) = self.platform.close_window(id).await {
            log::error!("Failed to close popup {}: {}", id, e);
        }
    }

    /// Handle a `chrome.windows.onRemoved` notification
    ///
    /// Returns true when the removed window was the tracked popup.
    pub fn handle_removed(&self, window_id: i32) -> bool {
        if self.popup_id.get() != Some(window_id) {
            return false;
        }
        self.popup_id.set(None);
        self.events.emit(&BackgroundEvent::ClosedPopUp { window_id });
        true
    }

    pub async fn open_connect_dapp(
        &self,
        id: u32,
        origin: &str,
        logo: Option<&str>,
    ) -> Result<i32, WindowError> {
        let route = Route::ConnectDapp {
            id,
            origin: origin.to_string(),
            logo: logo.unwrap_or_default().to_string(),
        };
        self.open(&route.to_path()).await
    }

    /// `id` names the dApp request to resolve once the wallet is unlocked
    pub async fn open_unlock(&self, id: Option<u32>) -> Result<i32, WindowError> {
        self.open(&Route::Unlock { id }.to_path()).await
    }

    pub async fn open_switch_network(
        &self,
        id: u32,
        origin: &str,
        network: &str,
        logo: Option<&str>,
    ) -> Result<i32, WindowError> {
        let route = Route::SwitchNetwork {
            id,
            origin: origin.to_string(),
            logo: logo.unwrap_or_default().to_string(),
            network: network.to_string(),
        };
        self.open(&route.to_path()).await
    }

    /// Open the send flow straight at the confirm step for a dApp transfer
    pub async fn open_send_transaction(
        &self,
        id: u32,
        origin: &str,
        to: &str,
        value_nano: &str,
        data: Option<&str>,
    ) -> Result<i32, WindowError> {
        let route = send_transaction_route(id, origin, to, value_nano, data)
            .map_err(|e| WindowError::Decode(e.to_string()))?;
        self.open(&route.to_path()).await
    }
}

fn send_transaction_route(
    id: u32,
    origin: &str,
    to: &str,
    value_nano: &str,
    data: Option<&str>,
) -> Result<Route, FlowError> {
    let state = SendState {
        address: to.to_string(),
        amount: from_nano(value_nano)?,
        max: false,
        comment: data.unwrap_or_default().to_string(),
        request: Some(DappRequest {
            id,
            origin: origin.to_string(),
        }),
    };
    Ok(Route::Send(SendFlow::Confirm(state)))
}

/// Place the popup in the top right corner of `window`
fn top_right_corner(window: &WindowInfo) -> (i32, i32) {
    let top = window.top.unwrap_or(0);
    let left = window.left.unwrap_or(0) + (window.width.unwrap_or(POPUP_WIDTH) - POPUP_WIDTH);
    (left, top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakePlatform {
        windows: RefCell<Vec<WindowInfo>>,
        created: RefCell<Vec<WindowOptions>>,
        focused: RefCell<Vec<i32>>,
        fail_close: bool,
        next_id: Cell<i32>,
    }

    impl FakePlatform {
        fn with_browser_window() -> Self {
            let platform = FakePlatform::default();
            platform.windows.borrow_mut().push(WindowInfo {
                id: Some(1),
                kind: Some("normal".to_string()),
                top: Some(50),
                left: Some(100),
                width: Some(1200),
                height: Some(800),
            });
            platform.next_id.set(10);
            platform
        }
    }

    #[async_trait(?Send)]
    impl WindowPlatform for FakePlatform {
        async fn get_all_windows(&self) -> Result<Vec<WindowInfo>, WindowError> {
            Ok(self.windows.borrow().clone())
        }

        async fn get_last_focused_window(&self) -> Result<WindowInfo, WindowError> {
            self.windows
                .borrow()
                .first()
                .cloned()
                .ok_or_else(|| WindowError::Platform("no windows".to_string()))
        }

        async fn focus_window(&self, id: i32) -> Result<(), WindowError> {
            self.focused.borrow_mut().push(id);
            Ok(())
        }

        async fn open_window(&self, options: WindowOptions) -> Result<WindowInfo, WindowError> {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            let window = WindowInfo {
                id: Some(id),
                kind: Some(options.kind.clone()),
                top: Some(options.top),
                left: Some(options.left),
                width: Some(options.width),
                height: Some(options.height),
            };
            self.windows.borrow_mut().push(window.clone());
            self.created.borrow_mut().push(options);
            Ok(window)
        }

        async fn close_window(&self, id: i32) -> Result<(), WindowError> {
            if self.fail_close {
                return Err(WindowError::Platform("gone".to_string()));
            }
            self.windows.borrow_mut().retain(|w| w.id != Some(id));
            Ok(())
        }
    }

    fn manager(platform: FakePlatform) -> (PopupManager<FakePlatform>, Rc<EventEmitter>) {
        let events = Rc::new(EventEmitter::new());
        (PopupManager::new(platform, events.clone()), events)
    }

    #[test]
    fn test_unlock_page_names_waiting_request() {
        let (manager, _) = manager(FakePlatform::with_browser_window());

        block_on(manager.open_unlock(Some(4))).unwrap();

        let created = manager.platform.created.borrow();
        assert_eq!(created[0].url, "index.html#/notification/unlock?id=4");
    }

    #[test]
    fn test_open_creates_popup_in_top_right_corner() {
        let (manager, _) = manager(FakePlatform::with_browser_window());

        let id = block_on(manager.open("/notification/unlock")).unwrap();

        assert_eq!(id, 10);
        assert_eq!(manager.popup_id(), Some(10));
        let created = manager.platform.created.borrow();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].url, "index.html#/notification/unlock");
        assert_eq!(created[0].kind, "popup");
        assert_eq!((created[0].width, created[0].height), (380, 620));
        assert_eq!(created[0].left, 100 + 1200 - 380);
        assert_eq!(created[0].top, 50);
    }

    #[test]
    fn test_second_open_focuses_existing_popup() {
        let (manager, _) = manager(FakePlatform::with_browser_window());

        let first = block_on(manager.open("/notification/unlock")).unwrap();
        let second = block_on(manager.open("/send")).unwrap();

        assert_eq!(first, second);
        assert_eq!(manager.platform.created.borrow().len(), 1);
        assert_eq!(*manager.platform.focused.borrow(), vec![first]);
    }

    #[test]
    fn test_open_replaces_popup_that_no_longer_exists() {
        let (manager, _) = manager(FakePlatform::with_browser_window());

        let first = block_on(manager.open("/notification/unlock")).unwrap();
        manager.platform.windows.borrow_mut().retain(|w| w.id != Some(first));
        let second = block_on(manager.open("/notification/unlock")).unwrap();

        assert_ne!(first, second);
        assert_eq!(manager.popup_id(), Some(second));
        assert!(manager.platform.focused.borrow().is_empty());
    }

    #[test]
    fn test_user_close_emits_exactly_one_event() {
        let (manager, events) = manager(FakePlatform::with_browser_window());
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            events.subscribe(move |event| seen.borrow_mut().push(event.clone()));
        }

        let id = block_on(manager.open("/notification/unlock")).unwrap();

        assert!(!manager.handle_removed(1));
        assert!(manager.handle_removed(id));
        assert!(!manager.handle_removed(id));

        assert_eq!(manager.popup_id(), None);
        assert_eq!(*seen.borrow(), vec![BackgroundEvent::ClosedPopUp { window_id: id }]);
    }

    #[test]
    fn test_close_swallows_failures() {
        let mut platform = FakePlatform::with_browser_window();
        platform.fail_close = true;
        let (manager, _) = manager(platform);

        block_on(manager.close(Some(1)));
        block_on(manager.close(None));

        assert_eq!(manager.platform.windows.borrow().len(), 1);
    }

    #[test]
    fn test_entry_points_build_pages() {
        let (manager, _) = manager(FakePlatform::with_browser_window());

        block_on(manager.open_connect_dapp(3, "https://dapp.example", None)).unwrap();
        let url = manager.platform.created.borrow()[0].url.clone();
        assert_eq!(
            url,
            "index.html#/notification/dapp?id=3&origin=https%3A%2F%2Fdapp.example&logo="
        );
    }

    #[test]
    fn test_send_transaction_opens_confirm_step() {
        let route = send_transaction_route(
            8,
            "https://dapp.example",
            "EQD4FPq-PRDieyQKkizFTRtSDyucUIqrj0v_zXJmqaDp6_0t",
            "2500000000",
            Some("order 15"),
        )
        .unwrap();

        let Route::Send(SendFlow::Confirm(state)) = route else {
            panic!("expected confirm step");
        };
        assert_eq!(state.amount, "2.5");
        assert_eq!(state.comment, "order 15");
        assert_eq!(state.request.unwrap().id, 8);

        assert!(send_transaction_route(1, "o", "a", "lots", None).is_err());
    }
}
