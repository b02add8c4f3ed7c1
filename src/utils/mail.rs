use crate::config::{EmailBackend, MailConfig};
use crate::types::mail::SendEmail;
use reqwest::{Client, ClientBuilder};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub async fn send_email(mail: &MailConfig, mut email: SendEmail) -> Result<String, String> {
    if email.from.is_empty() || email.from == SendEmail::default().from {
        email.from = mail.default_from.clone();
    }

    match mail.backend {
        EmailBackend::Console => {
            info!(
                from = %email.from,
                to = ?email.to,
                subject = %email.subject,
                "[mail] console backend:\n{}",
                email.text.as_deref().or(email.html.as_deref()).unwrap_or_default()
            );
            Ok("console".to_string())
        }
        EmailBackend::Http => send_http(mail, &email).await,
    }
}

async fn send_http(mail: &MailConfig, email: &SendEmail) -> Result<String, String> {
    let payload = serde_json::to_string(email)
        .map_err(|e| format!("serialize email failed: {e}"))?;

    let client: Client = ClientBuilder::new()
        .user_agent("flowtels/1.0 (+reqwest)")
        .tcp_nodelay(true)
        .pool_idle_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| format!("build client failed: {e}"))?;

    let req = client
        .post(&mail.endpoint)
        .bearer_auth(&mail.api_key)
        .header("Content-Type", "application/json")
        .body(payload)
        .build()
        .map_err(|e| format!("build request failed: {e}"))?;

    debug!(endpoint = %mail.endpoint, to = ?email.to, "[mail] -> POST");

    let t0 = Instant::now();
    let res = client.execute(req).await.map_err(|e| format!("send failed: {e}"))?;
    let status = res.status();
    let body = res.text().await.map_err(|e| format!("read body failed: {e}"))?;

    debug!(%status, elapsed_ms = t0.elapsed().as_millis() as u64, "[mail] <- response");

    if status.is_success() {
        Ok(body)
    } else {
        warn!(%status, "mail API rejected message");
        Err(format!("mail API error: HTTP {status}: {body}"))
    }
}

pub async fn mail_password_reset(
    mail: &MailConfig,
    domain: &str,
    to: &str,
    uidb64: &str,
    token: &str,
) -> Result<String, String> {
    let link = format!("https://{domain}/accounts/password/reset/{uidb64}/{token}/");
    send_email(mail, SendEmail {
        to: vec![to.to_string()],
        subject: format!("Password reset on {domain}"),
        text: Some(format!(
            "You're receiving this email because you requested a password reset for your user account at {domain}.\n\n\
             Please go to the following page and choose a new password:\n\n{link}\n\n\
             If you didn't request this, you can ignore this email."
        )),
        ..Default::default()
    })
    .await
}
