/// Notification popups opened by the background on behalf of a dApp

use crate::bridge::popup_bridge;
use crate::config::DEFAULT_ASK_TIMEOUT;
use crate::route::Route;
use crate::ui::components::{Field, Headline};
use patternfly_yew::prelude::*;
use serde_json::json;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

/// Report the user's decision, then let the background close this window
fn resolve(id: u32, approved: bool) {
    let bridge = popup_bridge();
    if let Err(e) = bridge.send("resolveDappRequest", json!({ "id": id, "approved": approved })) {
        log::error!("Failed to resolve dApp request {}: {}", id, e);
    }
    close_popup();
}

fn decision(id: u32, approved: bool) -> Callback<MouseEvent> {
    Callback::from(move |_: MouseEvent| resolve(id, approved))
}

#[derive(Properties, PartialEq)]
struct OriginProps {
    origin: AttrValue,
    logo: AttrValue,
}

#[function_component(Origin)]
fn origin(props: &OriginProps) -> Html {
    html! {
        <div class="dapp-origin">
            if !props.logo.is_empty() {
                <img class="dapp-logo" src={props.logo.clone()} alt="" />
            }
            <p class="address">{props.origin.clone()}</p>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ConnectDappProps {
    pub id: u32,
    pub origin: AttrValue,
    pub logo: AttrValue,
}

#[function_component(ConnectDapp)]
pub fn connect_dapp(props: &ConnectDappProps) -> Html {
    html! {
        <div class="flex-column-gap">
            <Headline title="Connect to dApp" subtitle={AttrValue::from("Allow this site to see your wallet address")} />
            <Origin origin={props.origin.clone()} logo={props.logo.clone()} />
            <div class="button-row">
                <Button onclick={decision(props.id, false)} variant={ButtonVariant::Secondary}>{"Cancel"}</Button>
                <Button onclick={decision(props.id, true)} variant={ButtonVariant::Primary}>{"Connect"}</Button>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SwitchNetworkProps {
    pub id: u32,
    pub origin: AttrValue,
    pub logo: AttrValue,
    pub network: AttrValue,
}

#[function_component(SwitchNetwork)]
pub fn switch_network(props: &SwitchNetworkProps) -> Html {
    html! {
        <div class="flex-column-gap">
            <Headline title="Switch network" subtitle={AttrValue::from(format!("The site asks to switch to {}", props.network))} />
            <Origin origin={props.origin.clone()} logo={props.logo.clone()} />
            <div class="button-row">
                <Button onclick={decision(props.id, false)} variant={ButtonVariant::Secondary}>{"Cancel"}</Button>
                <Button onclick={decision(props.id, true)} variant={ButtonVariant::Primary}>{"Switch"}</Button>
            </div>
        </div>
    }
}

fn close_popup() {
    if let Err(e) = popup_bridge().send("closePopUp", ()) {
        log::error!("Failed to close popup: {}", e);
    }
}

#[derive(Properties, PartialEq)]
pub struct UnlockProps {
    /// dApp request waiting on the unlock
    pub id: Option<u32>,
    pub on_navigate: Callback<Route>,
}

#[function_component(Unlock)]
pub fn unlock(props: &UnlockProps) -> Html {
    let password = use_state(String::new);
    let error = use_state(|| None::<String>);
    let unlocking = use_state(|| false);

    let on_password = {
        let password = password.clone();
        Callback::from(move |value: String| password.set(value))
    };

    let on_unlock = {
        let id = props.id;
        let password = password.clone();
        let error = error.clone();
        let unlocking = unlocking.clone();
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |_: MouseEvent| {
            let password = (*password).clone();
            let error = error.clone();
            let unlocking = unlocking.clone();
            let on_navigate = on_navigate.clone();

            unlocking.set(true);
            error.set(None);
            spawn_local(async move {
                let unlocked = popup_bridge()
                    .ask::<()>(
                        "unlockWallet",
                        json!({ "password": password, "id": id }),
                        DEFAULT_ASK_TIMEOUT,
                    )
                    .await;
                unlocking.set(false);
                match unlocked {
                    // The background already answered the dApp
                    Ok(()) if id.is_some() => close_popup(),
                    Ok(()) => on_navigate.emit(Route::Home),
                    Err(e) => {
                        log::warn!("Unlock failed: {}", e);
                        error.set(Some(e.to_string()));
                    }
                }
            });
        })
    };

    let on_cancel = {
        let id = props.id;
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |_: MouseEvent| match id {
            Some(id) => resolve(id, false),
            None => on_navigate.emit(Route::Home),
        })
    };

    html! {
        <div class="flex-column-gap">
            <Headline title="Wallet is locked" subtitle={AttrValue::from("Enter your password to continue")} />
            <Field
                label="Password"
                input_type="password"
                value={(*password).clone()}
                oninput={on_password}
                disabled={*unlocking}
            />

            if let Some(err) = (*error).clone() {
                <Alert r#type={AlertType::Danger} title={err} inline={true}>
                </Alert>
            }

            <div class="button-row">
                <Button onclick={on_cancel} variant={ButtonVariant::Secondary} disabled={*unlocking}>{"Cancel"}</Button>
                <Button onclick={on_unlock} variant={ButtonVariant::Primary} disabled={*unlocking || password.is_empty()}>{"Unlock"}</Button>
            </div>
        </div>
    }
}
