/// Reusable UI components

use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct FieldProps {
    pub label: AttrValue,
    pub value: AttrValue,
    pub oninput: Callback<String>,
    #[prop_or(AttrValue::Static("text"))]
    pub input_type: AttrValue,
    #[prop_or(false)]
    pub disabled: bool,
}

/// Labelled single-line input reporting its full value on every keystroke
#[function_component(Field)]
pub fn field(props: &FieldProps) -> Html {
    let oninput = {
        let oninput = props.oninput.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                oninput.emit(input.value());
            }
        })
    };

    html! {
        <div class="field">
            <label class="field-label">{props.label.clone()}</label>
            <input
                class="field-input"
                type={props.input_type.clone()}
                value={props.value.clone()}
                disabled={props.disabled}
                {oninput}
            />
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct TextAreaProps {
    pub value: AttrValue,
    pub oninput: Callback<String>,
    #[prop_or(10)]
    pub rows: u32,
    #[prop_or(false)]
    pub disabled: bool,
}

#[function_component(TextArea)]
pub fn text_area(props: &TextAreaProps) -> Html {
    let oninput = {
        let oninput = props.oninput.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(area) = e.target_dyn_into::<HtmlTextAreaElement>() {
                oninput.emit(area.value());
            }
        })
    };

    html! {
        <textarea
            class="field-textarea"
            rows={props.rows.to_string()}
            value={props.value.clone()}
            disabled={props.disabled}
            {oninput}
        />
    }
}

#[derive(Properties, PartialEq)]
pub struct HeadlineProps {
    pub title: AttrValue,
    #[prop_or_default]
    pub subtitle: Option<AttrValue>,
}

/// Centered title block used by the status screens
#[function_component(Headline)]
pub fn headline(props: &HeadlineProps) -> Html {
    html! {
        <div class="headline">
            <h1 class="headline-title">{props.title.clone()}</h1>
            if let Some(subtitle) = &props.subtitle {
                <p class="headline-subtitle">{subtitle.clone()}</p>
            }
        </div>
    }
}
