use crux_core::testing::AppTester;
use proptest::prelude::*;
use shared::capabilities::{HttpError, HttpRequest, HttpResponse, HttpResult, KvOperation};
use shared::{
    App, AuthStep, Effect, Event, Model, Secret, GENERIC_ERROR_MESSAGE, PHONE_LENGTH_MESSAGE,
};

fn response(status: u16, body: &str) -> Box<HttpResult> {
    Box::new(Ok(HttpResponse::new(status, body.as_bytes().to_vec())))
}

fn http_requests(effects: &[Effect]) -> Vec<&HttpRequest> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(&request.operation),
            _ => None,
        })
        .collect()
}

fn body_json(request: &HttpRequest) -> serde_json::Value {
    serde_json::from_slice(request.body.as_deref().expect("request has a body"))
        .expect("request body is json")
}

/// Drive a fresh app to the code entry step with phone +7 999 123 45 67.
fn advance_to_code(app: &AppTester<App, Effect>, model: &mut Model) {
    app.update(
        Event::AuthStatusReceived(response(200, r#"{"authorized":false}"#)),
        model,
    );
    app.update(Event::CountrySelected { code: "+7".into() }, model);
    app.update(
        Event::SubmitPhone {
            raw: "9991234567".into(),
        },
        model,
    );
    app.update(Event::SendCodeReceived(response(200, "{}")), model);
    assert_eq!(model.session.step, AuthStep::Code);
    assert_eq!(model.session.phone, "+79991234567");
}

#[test]
fn submit_phone_concatenates_country_code() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::AuthStatusReceived(response(200, r#"{"authorized":false}"#)),
        &mut model,
    );
    app.update(Event::CountrySelected { code: "+7".into() }, &mut model);

    let update = app.update(
        Event::SubmitPhone {
            raw: "9991234567".into(),
        },
        &mut model,
    );
    let requests = http_requests(&update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/auth/send-code");
    assert_eq!(body_json(requests[0])["phone"], "+79991234567");
}

#[test]
fn phone_outside_range_never_reaches_network() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::SubmitPhone {
            raw: "12-34".into(),
        },
        &mut model,
    );
    assert!(http_requests(&update.effects).is_empty());
    assert_eq!(model.auth.status.as_deref(), Some(PHONE_LENGTH_MESSAGE));
    assert_eq!(model.session.step, AuthStep::Phone);
}

#[test]
fn code_completion_submits_sign_in_exactly_once() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    advance_to_code(&app, &mut model);

    let mut sign_in_requests = Vec::new();
    for (index, digit) in "42019".chars().enumerate() {
        let update = app.update(Event::CodeDigitEntered { index, digit }, &mut model);
        for request in http_requests(&update.effects) {
            if request.path == "/auth/sign-in" {
                sign_in_requests.push(body_json(request));
            }
        }
    }

    assert_eq!(sign_in_requests.len(), 1, "one sign-in for five digits");
    assert_eq!(sign_in_requests[0]["phone"], "+79991234567");
    assert_eq!(sign_in_requests[0]["code"], "42019");
    assert!(model.auth.submitting);

    // re-completing the code while the request is in flight does nothing
    let update = app.update(
        Event::CodePasted {
            index: 0,
            text: "42019".into(),
        },
        &mut model,
    );
    assert!(http_requests(&update.effects).is_empty());
}

#[test]
fn sign_in_success_authorizes_and_loads_chats() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    advance_to_code(&app, &mut model);
    app.update(
        Event::CodePasted {
            index: 0,
            text: "42019".into(),
        },
        &mut model,
    );

    let update = app.update(
        Event::SignInReceived(response(200, r#"{"success":true}"#)),
        &mut model,
    );
    assert!(model.session.authorized);
    assert!(!model.auth.code_error);
    let requests = http_requests(&update.effects);
    assert!(requests.iter().any(|request| request.path == "/chats"));
    assert!(update
        .effects
        .iter()
        .any(|effect| matches!(effect, Effect::Haptics(_))));
}

#[test]
fn need_password_wins_over_success() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    advance_to_code(&app, &mut model);
    app.update(
        Event::CodePasted {
            index: 0,
            text: "42019".into(),
        },
        &mut model,
    );

    app.update(
        Event::SignInReceived(response(200, r#"{"needPassword":true,"success":true}"#)),
        &mut model,
    );
    assert_eq!(model.session.step, AuthStep::Password);
    assert!(!model.session.authorized);
    assert!(!model.auth.code_error);
    assert_eq!(model.auth.status, None);
}

#[test]
fn invalid_code_sets_error_and_allows_retry() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    advance_to_code(&app, &mut model);
    app.update(
        Event::CodePasted {
            index: 0,
            text: "11111".into(),
        },
        &mut model,
    );

    let update = app.update(
        Event::SignInReceived(response(
            200,
            r#"{"success":false,"error":"PHONE_CODE_INVALID"}"#,
        )),
        &mut model,
    );
    assert_eq!(model.session.step, AuthStep::Code);
    assert!(model.auth.code_error);
    assert_eq!(model.auth.status.as_deref(), Some("That code is incorrect."));
    assert!(!model.auth.submitting);
    assert!(update
        .effects
        .iter()
        .any(|effect| matches!(effect, Effect::Haptics(_))));

    // guard released, a corrected code submits again
    let update = app.update(
        Event::CodePasted {
            index: 0,
            text: "22222".into(),
        },
        &mut model,
    );
    let requests = http_requests(&update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(body_json(requests[0])["code"], "22222");
}

#[test]
fn network_failure_reads_as_generic_sign_in_failure() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    advance_to_code(&app, &mut model);
    app.update(
        Event::CodePasted {
            index: 0,
            text: "42019".into(),
        },
        &mut model,
    );

    app.update(
        Event::SignInReceived(Box::new(Err(HttpError::Network("socket closed".into())))),
        &mut model,
    );
    assert_eq!(model.session.step, AuthStep::Code);
    assert!(model.auth.code_error);
    assert_eq!(model.auth.status.as_deref(), Some(GENERIC_ERROR_MESSAGE));
}

#[test]
fn resend_is_independent_of_the_submit_guard() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    advance_to_code(&app, &mut model);
    app.update(
        Event::CodePasted {
            index: 0,
            text: "42019".into(),
        },
        &mut model,
    );
    assert!(model.auth.submitting);

    let update = app.update(Event::ResendCode, &mut model);
    let requests = http_requests(&update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/auth/send-code");
    assert_eq!(body_json(requests[0])["phone"], "+79991234567");
    assert_eq!(model.session.step, AuthStep::Code);
}

#[test]
fn empty_password_is_rejected_locally() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    advance_to_code(&app, &mut model);
    app.update(
        Event::CodePasted {
            index: 0,
            text: "42019".into(),
        },
        &mut model,
    );
    app.update(
        Event::SignInReceived(response(200, r#"{"needPassword":true}"#)),
        &mut model,
    );

    let update = app.update(
        Event::SubmitPassword {
            password: Secret::new("   "),
        },
        &mut model,
    );
    assert!(http_requests(&update.effects).is_empty());
    assert!(model.auth.status.is_some());
    assert_eq!(model.session.step, AuthStep::Password);
}

#[test]
fn password_success_completes_authorization() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    advance_to_code(&app, &mut model);
    app.update(
        Event::CodePasted {
            index: 0,
            text: "42019".into(),
        },
        &mut model,
    );
    app.update(
        Event::SignInReceived(response(200, r#"{"needPassword":true}"#)),
        &mut model,
    );

    let update = app.update(
        Event::SubmitPassword {
            password: Secret::new("hunter2"),
        },
        &mut model,
    );
    let requests = http_requests(&update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/auth/password");
    assert_eq!(body_json(requests[0])["password"], "hunter2");

    app.update(
        Event::PasswordReceived(response(200, r#"{"success":true}"#)),
        &mut model,
    );
    assert!(model.session.authorized);
    assert!(model.auth.password.is_empty());
}

#[test]
fn back_from_password_clears_transient_state() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    advance_to_code(&app, &mut model);
    app.update(
        Event::CodePasted {
            index: 0,
            text: "42019".into(),
        },
        &mut model,
    );
    app.update(
        Event::SignInReceived(response(200, r#"{"needPassword":true}"#)),
        &mut model,
    );
    app.update(
        Event::SubmitPassword {
            password: Secret::new("hunter2"),
        },
        &mut model,
    );

    app.update(Event::Back, &mut model);
    assert_eq!(model.session.step, AuthStep::Phone, "never back to code entry");
    assert!(model.auth.password.is_empty());
    assert_eq!(model.auth.code.value(), None);
    assert_eq!(model.auth.status, None);
    assert!(!model.auth.submitting);
    // the typed phone stays, so the user does not retype it
    assert_eq!(model.auth.phone_input, "9991234567");
}

#[test]
fn logout_resets_phone_from_authorized_state() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(
        Event::AuthStatusReceived(response(200, r#"{"authorized":true}"#)),
        &mut model,
    );
    assert!(model.session.authorized);

    let update = app.update(Event::Logout, &mut model);
    let requests = http_requests(&update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/api/auth/logout");
    assert!(!model.session.authorized);
    assert_eq!(model.session.phone, "");
    assert_eq!(model.session.step, AuthStep::Phone);
}

#[test]
fn startup_checks_status_and_intro_flag() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::AppStarted, &mut model);
    let requests = http_requests(&update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/auth/status");
    assert!(update.effects.iter().any(|effect| matches!(
        effect,
        Effect::Kv(request) if matches!(&request.operation, KvOperation::Get { key } if key == "intro_seen")
    )));
}

proptest! {
    /// A send-code request leaves the core exactly when the raw input holds
    /// 7 to 16 digit characters, whatever else it contains.
    #[test]
    fn send_code_fires_iff_digit_count_in_range(raw in "\\PC{0,24}") {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();
        app.update(Event::CountrySelected { code: "+1".into() }, &mut model);

        let update = app.update(Event::SubmitPhone { raw: raw.clone() }, &mut model);
        let digit_count = raw.chars().filter(char::is_ascii_digit).count();
        let sent = !http_requests(&update.effects).is_empty();
        prop_assert_eq!(sent, (7..=16).contains(&digit_count));
    }
}
