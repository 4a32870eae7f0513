/// Send screens: one component per flow phase

use crate::bridge::popup_bridge;
use crate::config::{CONFIRM_TIMEOUT, DEFAULT_ASK_TIMEOUT, NetworkConfig};
use crate::platform::open_tab;
use crate::route::Route;
use crate::sdk::FeeEstimate;
use crate::send::{SendFlow, SendState};
use crate::ui::components::{Field, Headline};
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

/// Mirror the flow to the background so a relaunched popup can resume it
fn store_operation(flow: &SendFlow) {
    if let Err(e) = popup_bridge().send("storeOperation", flow.pending_operation()) {
        log::error!("Failed to store operation: {}", e);
    }
}

#[derive(Properties, PartialEq)]
pub struct SendPageProps {
    pub flow: SendFlow,
    pub balance: Option<String>,
    pub wallet: Option<String>,
    pub network: NetworkConfig,
    pub on_navigate: Callback<Route>,
}

#[function_component(SendPage)]
pub fn send_page(props: &SendPageProps) -> Html {
    let on_flow = {
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |flow: SendFlow| {
            log::debug!("send flow -> {}", flow.phase());
            store_operation(&flow);
            on_navigate.emit(Route::Send(flow));
        })
    };

    // Leaving the flow drops the stored operation too
    let on_home = {
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |_: ()| {
            if let Err(e) = popup_bridge().send("storeOperation", serde_json::Value::Null) {
                log::error!("Failed to clear operation: {}", e);
            }
            on_navigate.emit(Route::Home);
        })
    };

    match &props.flow {
        SendFlow::Input(state) => html! {
            <InputView state={state.clone()} balance={props.balance.clone()} {on_flow} on_cancel={on_home} />
        },
        SendFlow::Confirm(state) => html! {
            <ConfirmView state={state.clone()} {on_flow} on_cancel={on_home} />
        },
        SendFlow::Pending { seqno } => html! {
            <PendingView seqno={*seqno} {on_flow} />
        },
        SendFlow::Success { .. } => html! {
            <SuccessView wallet={props.wallet.clone()} network={props.network} on_close={on_home} />
        },
    }
}

#[derive(Properties, PartialEq)]
struct InputProps {
    state: SendState,
    balance: Option<String>,
    on_flow: Callback<SendFlow>,
    on_cancel: Callback<()>,
}

#[function_component(InputView)]
fn input_view(props: &InputProps) -> Html {
    let error = use_state(|| None::<String>);

    let edit = |update: fn(SendState, String) -> SendState| {
        let state = props.state.clone();
        let on_flow = props.on_flow.clone();
        Callback::from(move |value: String| {
            on_flow.emit(SendFlow::Input(update(state.clone(), value)));
        })
    };
    let on_address = edit(|state, value| state.with_address(value));
    let on_amount = edit(|state, value| state.with_amount(value));
    let on_comment = edit(|state, value| state.with_comment(value));

    let on_max = {
        let state = props.state.clone();
        let balance = props.balance.clone();
        let on_flow = props.on_flow.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(balance) = &balance {
                on_flow.emit(SendFlow::Input(state.clone().with_max(balance.clone())));
            }
        })
    };

    let on_next = {
        let state = props.state.clone();
        let on_flow = props.on_flow.clone();
        let error = error.clone();
        Callback::from(move |_: MouseEvent| match SendFlow::Input(state.clone()).submit() {
            Ok(flow) => {
                error.set(None);
                on_flow.emit(flow);
            }
            Err(e) => error.set(Some(e.to_string())),
        })
    };

    let on_cancel = {
        let on_cancel = props.on_cancel.clone();
        Callback::from(move |_: MouseEvent| on_cancel.emit(()))
    };

    html! {
        <div class="flex-column-gap">
            <h1 class="popup-title">{"Send TON"}</h1>
            <Field label="Enter wallet address" value={props.state.address.clone()} oninput={on_address} />
            <Field label="Amount" input_type="number" value={props.state.amount.clone()} oninput={on_amount} />
            <div class="max-row">
                <button class="max-button" onclick={on_max} disabled={props.balance.is_none()}>{"Max"}</button>
                {format!("{} TON", props.balance.clone().unwrap_or_else(|| "-".to_string()))}
            </div>
            <Field label="Comment (optional)" value={props.state.comment.clone()} oninput={on_comment} />

            if let Some(err) = (*error).clone() {
                <Alert r#type={AlertType::Danger} title={err} inline={true}>
                </Alert>
            }

            <div class="button-row">
                <Button onclick={on_cancel} variant={ButtonVariant::Secondary}>{"Cancel"}</Button>
                <Button onclick={on_next} variant={ButtonVariant::Primary}>{"Next"}</Button>
            </div>
        </div>
    }
}

#[derive(Clone, PartialEq)]
enum FeeStatus {
    Loading,
    Ready(FeeEstimate),
    Unavailable(String),
}

#[derive(Properties, PartialEq)]
struct ConfirmProps {
    state: SendState,
    on_flow: Callback<SendFlow>,
    on_cancel: Callback<()>,
}

#[function_component(ConfirmView)]
fn confirm_view(props: &ConfirmProps) -> Html {
    let fee = use_state(|| FeeStatus::Loading);
    let sending = use_state(|| false);
    let error = use_state(|| None::<String>);

    // Estimate the fee whenever the transfer changes
    {
        let fee = fee.clone();
        use_effect_with(props.state.clone(), move |state| {
            let transfer = state.transfer();
            fee.set(FeeStatus::Loading);
            spawn_local(async move {
                match popup_bridge()
                    .ask::<FeeEstimate>("estimateFee", &transfer, DEFAULT_ASK_TIMEOUT)
                    .await
                {
                    Ok(estimate) => fee.set(FeeStatus::Ready(estimate)),
                    Err(e) => {
                        log::warn!("Fee estimate failed: {}", e);
                        fee.set(FeeStatus::Unavailable(e.to_string()));
                    }
                }
            });
            || ()
        });
    }

    let on_confirm = {
        let state = props.state.clone();
        let on_flow = props.on_flow.clone();
        let sending = sending.clone();
        let error = error.clone();
        Callback::from(move |_: MouseEvent| {
            let state = state.clone();
            let on_flow = on_flow.clone();
            let sending = sending.clone();
            let error = error.clone();

            sending.set(true);
            error.set(None);
            spawn_local(async move {
                let sent = popup_bridge()
                    .ask::<u32>("sendTransaction", state.transfer(), DEFAULT_ASK_TIMEOUT)
                    .await;
                match sent {
                    Ok(seqno) => match SendFlow::Confirm(state).sent(seqno) {
                        Ok(flow) => on_flow.emit(flow),
                        Err(e) => error.set(Some(e.to_string())),
                    },
                    Err(e) => {
                        log::error!("Send failed: {}", e);
                        error.set(Some(format!("Send failed: {}", e)));
                    }
                }
                sending.set(false);
            });
        })
    };

    let on_edit = {
        let state = props.state.clone();
        let on_flow = props.on_flow.clone();
        Callback::from(move |_: MouseEvent| {
            if let Ok(flow) = SendFlow::Confirm(state.clone()).edit() {
                on_flow.emit(flow);
            }
        })
    };

    let on_cancel = {
        let on_cancel = props.on_cancel.clone();
        Callback::from(move |_: MouseEvent| on_cancel.emit(()))
    };

    // One request at a time over the bridge
    let busy = *sending || *fee == FeeStatus::Loading;

    html! {
        <div class="flex-column-gap">
            <Button onclick={on_edit} variant={ButtonVariant::Link} disabled={*sending}>{"< Edit"}</Button>
            <p class="message-text">{"Send "}<b>{props.state.amount.clone()}</b>{" TON to"}</p>
            <p class="address">{props.state.address.clone()}</p>
            if !props.state.comment.is_empty() {
                <p class="message-text">{format!("Comment: \"{}\"", props.state.comment)}</p>
            }
            if let Some(request) = &props.state.request {
                <p class="message-text">{format!("Requested by {}", request.origin)}</p>
            }

            <h3 class="stats-title">{"Network fee estimation"}</h3>
            {match &*fee {
                FeeStatus::Loading => html! { <p class="message-text">{"Loading..."}</p> },
                FeeStatus::Ready(estimate) => html! { <p class="message-text">{estimate.describe()}</p> },
                FeeStatus::Unavailable(reason) => html! { <p class="message-text">{format!("Fee unavailable: {}", reason)}</p> },
            }}

            if let Some(err) = (*error).clone() {
                <Alert r#type={AlertType::Danger} title={err} inline={true}>
                </Alert>
            }

            <div class="button-row">
                <Button onclick={on_cancel} variant={ButtonVariant::Secondary} disabled={*sending}>{"Cancel"}</Button>
                <Button onclick={on_confirm} variant={ButtonVariant::Primary} disabled={busy}>{"Confirm"}</Button>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct PendingProps {
    seqno: u32,
    on_flow: Callback<SendFlow>,
}

#[function_component(PendingView)]
fn pending_view(props: &PendingProps) -> Html {
    let error = use_state(|| None::<String>);

    {
        let error = error.clone();
        let on_flow = props.on_flow.clone();
        use_effect_with(props.seqno, move |seqno| {
            let seqno = *seqno;
            spawn_local(async move {
                match popup_bridge().ask::<()>("confirmSeqNo", seqno, CONFIRM_TIMEOUT).await {
                    Ok(()) => match (SendFlow::Pending { seqno }).confirmed() {
                        Ok(flow) => on_flow.emit(flow),
                        Err(e) => error.set(Some(e.to_string())),
                    },
                    // Stay on this screen; the user can reopen the popup to retry
                    Err(e) => {
                        log::error!("Confirmation of seqno {} failed: {}", seqno, e);
                        error.set(Some(e.to_string()));
                    }
                }
            });
            || ()
        });
    }

    html! {
        <div class="loading-text-center">
            <Spinner />
            <Headline title="Await confirmation" subtitle={AttrValue::from("~10 sec")} />
            if let Some(err) = (*error).clone() {
                <Alert r#type={AlertType::Warning} title={err} inline={true}>
                </Alert>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct SuccessProps {
    wallet: Option<String>,
    network: NetworkConfig,
    on_close: Callback<()>,
}

#[function_component(SuccessView)]
fn success_view(props: &SuccessProps) -> Html {
    let on_explorer = {
        let url = props
            .wallet
            .as_deref()
            .map(|wallet| props.network.explorer_address_url(wallet));
        Callback::from(move |_: MouseEvent| {
            let Some(url) = url.clone() else {
                return;
            };
            spawn_local(async move {
                if let Err(e) = open_tab(&url).await {
                    log::error!("Failed to open explorer: {}", e);
                }
            });
        })
    };

    let on_close = {
        let on_close = props.on_close.clone();
        Callback::from(move |_: MouseEvent| on_close.emit(()))
    };

    html! {
        <div class="flex-column-gap">
            <Headline title="Success" subtitle={AttrValue::from("Transaction confirmed")} />
            <Button onclick={on_explorer} variant={ButtonVariant::Secondary} disabled={props.wallet.is_none()} block={true}>
                {"View on explorer"}
            </Button>
            <Button onclick={on_close} variant={ButtonVariant::Primary} block={true}>
                {"Close"}
            </Button>
        </div>
    }
}
