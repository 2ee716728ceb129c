//! Customer email drafting and SMTP delivery

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::generator::{submit_structured, GenerationError};
use crate::llm::tools::create_tool_declaration;
use crate::llm::{FunctionRegistry, GenerationConfig, LlmProvider, ToolChoice};
use crate::models::{EmailContent, OfferRecord, OutgoingEmail};

pub const COMPOSE_EMAIL_TOOL: &str = "compose_email";

const OFFER_EMAIL_SYSTEM_PROMPT: &str = "You are a professional business communication specialist. \
Generate clear, engaging, and customer-friendly email content for construction/service offers. \
Use proper formatting with line breaks and sections for readability.";

const ACCEPTANCE_EMAIL_SYSTEM_PROMPT: &str = "You are a professional business communication specialist. \
Generate warm, appreciative, and customer-friendly email content thanking clients for accepting \
construction/service offers. Show genuine gratitude and build confidence in the upcoming project. \
Use proper formatting with line breaks and sections for readability.";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Email credentials not configured. Please set SENDER_EMAIL and SENDER_EMAIL_PASSWORD")]
    NotConfigured,

    #[error("Email authentication failed. Please check your email credentials and ensure 'App Passwords' is enabled for Gmail")]
    Authentication,

    #[error("Invalid email address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("SMTP error occurred: {0}")]
    Smtp(String),

    #[error("Error building email: {0}")]
    Build(String),
}

/// Format an amount as US currency, e.g. `$1,234.56`
pub fn format_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Materials list as shown in email prompts
fn materials_text(record: &OfferRecord) -> String {
    let mut out = String::new();
    for (idx, m) in record.offer.bill_of_materials.iter().enumerate() {
        out.push_str(&format!("\n{}. {} - {}", idx + 1, m.material, m.category));
        out.push_str(&format!("\n   Quantity: {} {}", m.quantity, m.unit));
        out.push_str(&format!("\n   Price: ${}", m.price));
        if !m.description.is_empty() {
            out.push_str(&format!("\n   Description: {}", m.description));
        }
        out.push('\n');
    }
    out
}

/// Drafts customer emails with the LLM
#[derive(Clone)]
pub struct EmailComposer {
    provider: Arc<dyn LlmProvider>,
    max_tokens: u32,
}

impl EmailComposer {
    pub fn new(provider: Arc<dyn LlmProvider>, max_tokens: u32) -> Self {
        Self {
            provider,
            max_tokens,
        }
    }

    async fn compose(&self, system: &str, prompt: String) -> Result<EmailContent, GenerationError> {
        submit_structured(
            self.provider.clone(),
            FunctionRegistry::new(),
            create_tool_declaration::<EmailContent>(
                COMPOSE_EMAIL_TOOL,
                "Deliver the finished email: customer name, subject line and body.",
            ),
            ToolChoice::Required,
            GenerationConfig::new(self.max_tokens),
            system,
            prompt,
        )
        .await
    }

    /// Email presenting an offer to the customer
    pub async fn compose_offer_email(
        &self,
        record: &OfferRecord,
    ) -> Result<EmailContent, GenerationError> {
        let offer = &record.offer;
        let prompt = format!(
            "Generate a professional, warm, and engaging email to send to a customer regarding their construction/service offer.

Customer Details:
- Name: {name}
- Phone: {phone}
- Address: {address}

Offer Details:
- Task Description: {task}
- Estimated Time: {time}
- Bill of Materials: {materials}
- Price Breakdown:
  Materials Cost: {materials_cost}
  Labor Cost: {labor}
  Total Cost: {total}

The email should:
1. Be professional yet friendly and approachable
2. Thank the customer for their interest
3. Provide a clear overview of the project
4. Include all materials and pricing details in a well-formatted manner
5. Highlight the time estimate for completion
6. Include a call-to-action (e.g., contact for questions, approval, next steps)
7. End with a professional closing

Generate both an email subject line and the complete email body.
The email should be formatted in a clean, readable way with proper sections and spacing.",
            name = offer.customer_name,
            phone = offer.phone_number,
            address = offer.address,
            task = offer.task_description,
            time = offer.time,
            materials = materials_text(record),
            materials_cost = format_currency(offer.price.materials),
            labor = format_currency(offer.price.labor),
            total = format_currency(offer.price.total),
        );

        tracing::info!(offer_id = %record.id, "composing offer email");
        self.compose(OFFER_EMAIL_SYSTEM_PROMPT, prompt).await
    }

    /// Thank-you email after the customer accepted an offer
    pub async fn compose_acceptance_email(
        &self,
        record: &OfferRecord,
    ) -> Result<EmailContent, GenerationError> {
        let offer = &record.offer;
        let prompt = format!(
            "Generate a professional, warm, and appreciative email to thank a customer for accepting our construction/service offer.

Customer Details:
- Name: {name}
- Phone: {phone}
- Address: {address}

Project Details:
- Task Description: {task}
- Estimated Time: {time}
- Project Start Date: {start}
- Total Project Cost: {total}

The email should:
1. Express sincere gratitude and appreciation for accepting the offer
2. Confirm the project details briefly
3. Outline the next steps (e.g., scheduling, materials ordering, preparation)
4. Reassure the customer of quality service and commitment
5. Provide contact information for any questions or concerns
6. Express excitement about working together
7. End with a professional and warm closing

Generate both an email subject line and the complete email body.
The tone should be professional yet warm, showing genuine appreciation for their trust and business.
The email should be formatted in a clean, readable way with proper sections and spacing.",
            name = offer.customer_name,
            phone = offer.phone_number,
            address = offer.address,
            task = offer.task_description,
            time = offer.time,
            start = offer.project_start,
            total = format_currency(offer.price.total),
        );

        tracing::info!(offer_id = %record.id, "composing acceptance email");
        self.compose(ACCEPTANCE_EMAIL_SYSTEM_PROMPT, prompt).await
    }

    /// Blank draft addressed to the customer
    pub fn compose_custom_email(&self, record: &OfferRecord) -> EmailContent {
        EmailContent {
            customer_name: record.offer.customer_name.clone(),
            email_subject: String::new(),
            email_body: String::new(),
        }
    }
}

/// Outgoing mail delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Sends mail through an SMTP relay with STARTTLS
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn credentials(&self) -> Result<(&str, &str), MailError> {
        match (&self.config.sender_email, &self.config.sender_password) {
            (Some(email), Some(password)) => Ok((email.as_str(), password.as_str())),
            _ => Err(MailError::NotConfigured),
        }
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Plain text plus an HTML alternative with line breaks kept
pub fn build_message(from: &str, email: &OutgoingEmail) -> Result<Message, MailError> {
    let html = email.body.replace('\n', "<br>");

    Message::builder()
        .from(mailbox(from)?)
        .to(mailbox(&email.to)?)
        .subject(email.subject.clone())
        .multipart(MultiPart::alternative_plain_html(email.body.clone(), html))
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let (sender, password) = self.credentials()?;
        let message = build_message(sender, email)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(|e| MailError::Smtp(e.to_string()))?
            .port(self.config.port)
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .build();

        match transport.send(message).await {
            Ok(_) => {
                tracing::info!(to = %email.to, "email sent");
                Ok(())
            }
            Err(e) => {
                let auth_failed = e
                    .status()
                    .is_some_and(|code| matches!(code.to_string().as_str(), "530" | "534" | "535"));
                tracing::error!(error = %e, to = %email.to, "email delivery failed");
                if auth_failed {
                    Err(MailError::Authentication)
                } else {
                    Err(MailError::Smtp(e.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Mailer that records instead of sending
    #[derive(Default)]
    pub(crate) struct RecordingMailer {
        pub(crate) sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }
}
