use crate::bridge::popup_bridge;
use crate::config::{DEFAULT_ASK_TIMEOUT, Network};
use crate::mnemonic::{MNEMONIC_WORDS, Mnemonic};
use crate::route::Route;
use crate::storage;
use crate::ui::components::{Headline, TextArea};
use patternfly_yew::prelude::{Alert, AlertType, Button, ButtonVariant, Spinner};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ImportProps {
    pub network: Network,
    pub on_navigate: Callback<Route>,
}

#[function_component(ImportPage)]
pub fn import_page(props: &ImportProps) -> Html {
    let phrase = use_state(String::new);
    let error = use_state(|| None::<String>);
    let importing = use_state(|| false);

    let on_input = {
        let phrase = phrase.clone();
        Callback::from(move |value: String| phrase.set(value))
    };

    let on_import = {
        let phrase = phrase.clone();
        let error = error.clone();
        let importing = importing.clone();
        let network = props.network;
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |_: MouseEvent| {
            // Checked locally first; the background validates again
            let mnemonic = match Mnemonic::parse(&phrase) {
                Ok(mnemonic) => mnemonic,
                Err(e) => {
                    error.set(Some(e.to_string()));
                    return;
                }
            };

            let error = error.clone();
            let importing = importing.clone();
            let on_navigate = on_navigate.clone();
            importing.set(true);
            error.set(None);
            spawn_local(async move {
                let imported = popup_bridge()
                    .ask::<String>("importWallet", mnemonic.words(), DEFAULT_ASK_TIMEOUT)
                    .await
                    .map_err(|e| e.to_string());
                let saved = match imported {
                    Ok(address) => {
                        let account = storage::load_account(network).await.unwrap_or_default();
                        storage::save_account(network, &account.with_wallet(address)).await
                    }
                    Err(e) => Err(e),
                };
                importing.set(false);
                match saved {
                    Ok(()) => on_navigate.emit(Route::Home),
                    Err(e) => {
                        log::error!("Import failed: {}", e);
                        error.set(Some(e));
                    }
                }
            });
        })
    };

    let on_back = {
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |_: MouseEvent| on_navigate.emit(Route::Home))
    };

    html! {
        <div class="flex-column-gap">
            <Headline
                title="Import wallet"
                subtitle={AttrValue::from(format!("Enter the {} secret words of your wallet", MNEMONIC_WORDS))}
            />
            <TextArea value={(*phrase).clone()} oninput={on_input} disabled={*importing} />

            if let Some(err) = (*error).clone() {
                <Alert r#type={AlertType::Danger} title={err} inline={true}>
                </Alert>
            }
            if *importing {
                <div class="loading-text-center">
                    <Spinner />
                </div>
            }

            <div class="button-row">
                <Button onclick={on_back} variant={ButtonVariant::Secondary} disabled={*importing}>{"Back"}</Button>
                <Button onclick={on_import} variant={ButtonVariant::Primary} disabled={*importing}>{"Continue"}</Button>
            </div>
        </div>
    }
}
