//! Email rendering and delivery.

use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::{SmtpSettings, THRESHOLD_PERCENTAGE, TITLE_PREVIEW_LEN, WELCOME_SAMPLE_IMAGE};
use crate::error::{Result, TrackerError};
use crate::models::{EmailContent, EmailProductInfo, NotificationKind};

/// Delivers rendered emails.
pub trait Mailer: Send + Sync {
    fn deliver(&self, content: &EmailContent, recipients: &[String]) -> Result<()>;
}

/// Render the subject and HTML body for `kind`.
pub fn render(kind: NotificationKind, product: &EmailProductInfo) -> EmailContent {
    let short_title = shorten_title(&product.title);
    let title = &product.title;
    let url = &product.url;

    let (subject, body) = match kind {
        NotificationKind::Welcome => (
            format!("Welcome to Price Tracking for {}", short_title),
            format!(
                r#"
<div>
  <h2>Welcome to PriceTracker 🚀</h2>
  <p>You are now tracking {title}.</p>
  <p>Here's an example of how you'll receive updates:</p>
  <div style="border: 1px solid #ccc; padding: 10px; background-color: #f8f8f8;">
    <h3>{title} is back in stock!</h3>
    <p>We're excited to let you know that {title} is now back in stock.</p>
    <p>Don't miss out - <a href="{url}" target="_blank" rel="noopener noreferrer">buy it now</a>!</p>
    <img src="{image}" alt="Product Image" style="max-width: 100%;" />
  </div>
  <p>Stay tuned for more updates on {title} and other products you're tracking.</p>
</div>
"#,
                image = WELCOME_SAMPLE_IMAGE,
            ),
        ),
        NotificationKind::ChangeOfStock => (
            format!("{} is now back in stock!", short_title),
            format!(
                r#"
<div>
  <h4>Hey, {title} is now restocked! Grab yours before they run out again!</h4>
  <p>See the product <a href="{url}" target="_blank" rel="noopener noreferrer">here</a>.</p>
</div>
"#
            ),
        ),
        NotificationKind::LowestPrice => (
            format!("Lowest Price Alert for {}", short_title),
            format!(
                r#"
<div>
  <h4>Hey, {title} has reached its lowest price ever!!</h4>
  <p>Grab the product <a href="{url}" target="_blank" rel="noopener noreferrer">here</a> now.</p>
</div>
"#
            ),
        ),
        NotificationKind::ThresholdMet => (
            format!("Discount Alert for {}", short_title),
            format!(
                r#"
<div>
  <h4>Hey, {title} is now available at a discount more than {threshold}%!</h4>
  <p>Grab it right away from <a href="{url}" target="_blank" rel="noopener noreferrer">here</a>.</p>
</div>
"#,
                threshold = THRESHOLD_PERCENTAGE,
            ),
        ),
    };

    EmailContent { subject, body }
}

/// Cut titles longer than [`TITLE_PREVIEW_LEN`] characters and add an ellipsis.
pub fn shorten_title(title: &str) -> String {
    if title.chars().count() > TITLE_PREVIEW_LEN {
        let head: String = title.chars().take(TITLE_PREVIEW_LEN).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

// ---------------------------------------------------------------------------
// SmtpMailer
// ---------------------------------------------------------------------------

/// Sends HTML email through an authenticated STARTTLS relay.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let from: Mailbox = settings
            .username
            .parse()
            .map_err(|e| TrackerError::InvalidArgument(format!("Invalid sender address: {}", e)))?;
        let transport = SmtpTransport::starttls_relay(&settings.host)
            .map_err(|e| TrackerError::Mail(e.to_string()))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();
        Ok(Self { transport, from })
    }
}

impl Mailer for SmtpMailer {
    fn deliver(&self, content: &EmailContent, recipients: &[String]) -> Result<()> {
        if recipients.is_empty() {
            return Ok(());
        }

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(content.subject.clone())
            .header(ContentType::TEXT_HTML);
        for recipient in recipients {
            let mailbox: Mailbox = recipient.parse().map_err(|e| {
                TrackerError::InvalidArgument(format!("Invalid recipient {}: {}", recipient, e))
            })?;
            builder = builder.to(mailbox);
        }
        let message = builder
            .body(content.body.clone())
            .map_err(|e| TrackerError::Mail(e.to_string()))?;

        let response = self
            .transport
            .send(&message)
            .map_err(|e| TrackerError::Mail(e.to_string()))?;
        log::info!(
            "Email '{}' sent to {} recipient(s): {}",
            content.subject,
            recipients.len(),
            response.code()
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LogMailer
// ---------------------------------------------------------------------------

/// Logs emails instead of sending them. Used when no mail relay is configured.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn deliver(&self, content: &EmailContent, recipients: &[String]) -> Result<()> {
        if recipients.is_empty() {
            return Ok(());
        }
        log::info!(
            "Mail relay not configured; would send '{}' to {}",
            content.subject,
            recipients.join(", ")
        );
        Ok(())
    }
}
