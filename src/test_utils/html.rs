use axum::{body::Body, http::StatusCode, response::Response};
use scraper::{ElementRef, Html, Selector};

pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    let body = response.into_body();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Could not get response body");
    let text = String::from_utf8_lossy(&body).to_string();

    Html::parse_document(&text)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}

/// Get the document's only form, failing the test if there is not exactly one.
#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    let form_selector = Selector::parse("form").unwrap();
    let forms: Vec<ElementRef> = html.select(&form_selector).collect();

    assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());

    forms[0]
}

#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef, name: &str, input_type: &str) {
    let selector_string = format!("input[name={name}][type={input_type}]");
    let input_selector = Selector::parse(&selector_string).unwrap();
    let inputs: Vec<ElementRef> = form.select(&input_selector).collect();

    assert_eq!(
        inputs.len(),
        1,
        "want 1 {input_type} input named {name}, got {}",
        inputs.len()
    );
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef) {
    let button_selector = Selector::parse("button[type=submit]").unwrap();
    let buttons: Vec<ElementRef> = form.select(&button_selector).collect();

    assert_eq!(buttons.len(), 1, "want 1 submit button, got {}", buttons.len());
}

#[track_caller]
pub(crate) fn assert_redirect(response: &Response<Body>, want_location: &str) {
    let redirect_location = response
        .headers()
        .get("location")
        .expect("expected response to have a location header");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(redirect_location, want_location);
}

pub(crate) async fn assert_body_contains_message(response: Response<Body>, message: &str) {
    let body = response.into_body();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    let text = String::from_utf8_lossy(&body).to_string();

    assert!(
        text.contains(message),
        "response body should contain the text '{}' but got {}",
        message,
        text
    );
}
