//! Patching notice emails over an unauthenticated SMTP relay.
//!
//! The relay must accept mail from this host without credentials; no TLS
//! and no retries. Addresses are only checked when a message is built, so a
//! dry run never touches the mail settings.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;
use vmowner_core::config::MailConf;
use vmowner_core::{Notice, Notifier, NotifyError, UserRecord};

/// Operator details printed at the bottom of every notice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub title: String,
    pub email: String,
}

impl Signature {
    pub fn from_record(user: &UserRecord) -> Self {
        Self {
            name: user.display_name.clone().unwrap_or_default(),
            title: user.title.clone().unwrap_or_default(),
            email: user.email.clone().unwrap_or_default(),
        }
    }
}

/// Subject and body of the patching notice for one run.
#[derive(Debug, Clone)]
pub struct PatchNotice {
    pub date: String,
    pub signature: Signature,
}

impl PatchNotice {
    pub fn subject(&self) -> String {
        format!("[DO NOT REPLY] Server Patching {}", self.date)
    }

    pub fn html(&self, notice: &Notice) -> String {
        let name = escape(notice.given_name.as_deref().unwrap_or("there"));
        let servers = escape(&notice.server_list());
        let date = escape(&self.date);
        let sig_name = escape(&self.signature.name);
        let sig_title = escape(&self.signature.title);
        let sig_email = escape(&self.signature.email);

        format!(
            r#"<html>
<head></head>
<body>
<p>Hi {name},</p>
<p>You are a registered user of the system/s <b>{servers}</b> which is/are scheduled to be patched and rebooted <b>{date}</b>.</p>
<p>If you have access to the vCenter environment, <b>please ensure that your virtual machine/s are turned on during this time.</b></p>
<p>Make sure that any running processes have completed or have been stopped before patching. Please also close any sessions and log off.</p>
<p>Patching will commence at 7:30PM and finish by midnight. During this time the server will be rebooted.</p>
<p>Patching keeps your system secure with up to date software and has to be done regularly to protect against new vulnerabilities. If the system cannot be rebooted this time, please contact me directly or raise a service ticket to arrange a more suitable time.</p>
<p>The morning after, please check that your system is working and that you can access your network drives. If you experience any problems please reach out to the service desk.</p>
<p>Kind regards,</p>
<p>{sig_name}<br />{sig_title}<br /><a href="mailto:{sig_email}">{sig_email}</a></p>
</body>
</html>
"#
        )
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e: lettre::address::AddressError| NotifyError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

pub struct SmtpRelayNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    template: PatchNotice,
}

impl SmtpRelayNotifier {
    pub fn new(conf: &MailConf, template: PatchNotice) -> Self {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&conf.relay)
            .port(conf.port)
            .build();
        Self {
            transport,
            from: conf.from.clone(),
            template,
        }
    }

    pub fn message(&self, notice: &Notice) -> Result<Message, NotifyError> {
        Message::builder()
            .from(mailbox(&self.from)?)
            .to(mailbox(&notice.email)?)
            .subject(self.template.subject())
            .header(ContentType::TEXT_HTML)
            .body(self.template.html(notice))
            .map_err(|e| NotifyError::Message {
                recipient: notice.email.clone(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Notifier for SmtpRelayNotifier {
    async fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        let message = self.message(notice)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Delivery {
                recipient: notice.email.clone(),
                reason: e.to_string(),
            })?;
        debug!("relay answered {} for {}", response.code(), notice.email);
        Ok(())
    }
}
