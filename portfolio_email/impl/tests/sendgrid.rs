use portfolio_email_contracts::{Email, EmailSendError, EmailService};
use portfolio_email_impl::EmailServiceImpl;
use portfolio_models::Sensitive;
use portfolio_testing::sendgrid::FakeSendgrid;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::net::TcpListener;

const API_KEY: &str = "SG.test-api-key";

#[tokio::test]
async fn send_email() {
    let (sendgrid, sut) = setup(Some(API_KEY)).await;

    sut.send(email("The Subject")).await.unwrap();

    let messages = sendgrid.messages();
    assert_eq!(
        messages,
        [json!({
            "personalizations": [{ "to": [{ "email": "owner@example.com", "name": "Owner" }] }],
            "from": { "email": "contact@example.com", "name": "Portfolio" },
            "reply_to": { "email": "jane@example.com" },
            "subject": "The Subject",
            "content": [
                { "type": "text/plain", "value": "Hello\nWorld" },
                { "type": "text/html", "value": "<p>Hello<br>World</p>" },
            ],
        })]
    );
}

#[tokio::test]
async fn send_email_without_reply_to() {
    let (sendgrid, sut) = setup(Some(API_KEY)).await;

    sut.send(Email {
        reply_to: None,
        ..email("No reply")
    })
    .await
    .unwrap();

    let messages = sendgrid.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].get("reply_to").is_none());
}

#[tokio::test]
async fn rejected_api_key() {
    let (sendgrid, sut) = setup(Some("SG.wrong-api-key")).await;

    let result = sut.send(email("The Subject")).await;

    assert!(
        matches!(&result, Err(EmailSendError::Credentials(msg)) if msg.contains("API key")),
        "{result:?}"
    );
    assert!(sendgrid.messages().is_empty());
}

#[tokio::test]
async fn missing_api_key_is_not_sent() {
    let (sendgrid, sut) = setup(None).await;

    let result = sut.send(email("The Subject")).await;

    assert!(
        matches!(result, Err(EmailSendError::Credentials(_))),
        "{result:?}"
    );
    assert!(sendgrid.messages().is_empty());
}

#[tokio::test]
async fn other_provider_error() {
    let (sendgrid, sut) = setup(Some(API_KEY)).await;

    let result = sut.send(email("")).await;

    assert!(
        matches!(&result, Err(EmailSendError::Other(err)) if err.to_string().contains("subject")),
        "{result:?}"
    );
    assert!(sendgrid.messages().is_empty());
}

#[tokio::test]
async fn unreachable_provider() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sut = EmailServiceImpl::new(
        "contact@example.com".parse().unwrap(),
        Some(Sensitive(API_KEY.into())),
        Some(format!("http://{addr}").parse().unwrap()),
    )
    .unwrap();

    let result = sut.send(email("The Subject")).await;

    assert!(
        matches!(result, Err(EmailSendError::Transport(_))),
        "{result:?}"
    );
}

#[tokio::test]
async fn ping() {
    let (_, sut) = setup(Some(API_KEY)).await;
    sut.ping().await.unwrap();

    let (_, sut) = setup(Some("SG.wrong-api-key")).await;
    sut.ping().await.unwrap_err();

    let (_, sut) = setup(None).await;
    sut.ping().await.unwrap_err();
}

async fn setup(api_key: Option<&str>) -> (FakeSendgrid, EmailServiceImpl) {
    let sendgrid = FakeSendgrid::new(API_KEY);
    let addr = sendgrid.spawn().await.unwrap();

    let sut = EmailServiceImpl::new(
        "Portfolio <contact@example.com>".parse().unwrap(),
        api_key.map(|key| Sensitive(key.into())),
        Some(format!("http://{addr}").parse().unwrap()),
    )
    .unwrap();

    (sendgrid, sut)
}

fn email(subject: &str) -> Email {
    Email {
        recipient: "Owner <owner@example.com>".parse().unwrap(),
        reply_to: Some("jane@example.com".into()),
        subject: subject.into(),
        text_body: "Hello\nWorld".into(),
        html_body: "<p>Hello<br>World</p>".into(),
    }
}
