use std::sync::Arc;

use crate::clients::{Email, Mailer};
use crate::models::{BadgeApplication, BadgeApplicationStatus, Listing, ListingStatus};

/// Builds the transactional emails and sends them best-effort.
///
/// Delivery failures are logged and swallowed; none of the workflows
/// roll back because a message could not be sent.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    site_url: String,
    admin_email: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, site_url: String, admin_email: String) -> Self {
        Self {
            mailer,
            site_url,
            admin_email,
        }
    }

    async fn deliver(&self, email: Email) {
        if let Err(err) = self.mailer.send(&email).await {
            log::warn!("Failed to send email '{}': {err}", email.subject);
        }
    }

    /// Vendor confirmation plus admin review notice, sent together.
    pub async fn listing_submitted(&self, listing: &Listing, is_edit: bool) {
        let admin = admin_submission_email(listing, is_edit, &self.site_url, &self.admin_email);
        match vendor_submission_email(listing, is_edit, &self.admin_email) {
            Some(vendor) => {
                futures_util::future::join(self.deliver(vendor), self.deliver(admin)).await;
            }
            None => self.deliver(admin).await,
        }
    }

    pub async fn listing_live(&self, listing: &Listing) {
        if let Some(email) = listing_live_email(listing, &self.site_url, &self.admin_email) {
            self.deliver(email).await;
        }
    }

    pub async fn listing_claimed(&self, listing: &Listing, claimer_email: Option<&str>) {
        let email = listing_claimed_email(listing, claimer_email, &self.site_url, &self.admin_email);
        self.deliver(email).await;
    }

    pub async fn badge_decision(&self, application: &BadgeApplication, vendor_email: &str) {
        if let Some(email) = badge_decision_email(application, vendor_email, &self.site_url) {
            self.deliver(email).await;
        }
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn wrap(body: &str) -> String {
    format!(r#"<div style="font-family: Arial, sans-serif; line-height: 1.5;">{body}</div>"#)
}

fn recipient(listing: &Listing) -> Option<String> {
    listing
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
}

pub fn vendor_submission_email(listing: &Listing, is_edit: bool, reply_to: &str) -> Option<Email> {
    let to = recipient(listing)?;
    let name = escape_html(&listing.listing_name);
    let plan = escape_html(listing.plan.as_deref().unwrap_or("Free"));

    let subject = if is_edit {
        format!("Listing Updated: {}", listing.listing_name)
    } else {
        format!("Listing Submitted: {}", listing.listing_name)
    };
    let lead = if is_edit {
        format!("Thanks for updating <strong>{name}</strong>. Our team will review the changes shortly.")
    } else {
        format!("Thanks for submitting <strong>{name}</strong> on the <strong>{plan}</strong> plan.")
    };

    Some(Email {
        to: vec![to],
        subject,
        html: wrap(&format!(
            "<h2>{}</h2><p>{lead}</p><p>Listing ID: {}</p>",
            if is_edit { "Listing Updated" } else { "Listing Submitted" },
            listing.id
        )),
        reply_to: Some(reply_to.to_string()),
    })
}

pub fn admin_submission_email(
    listing: &Listing,
    is_edit: bool,
    site_url: &str,
    admin_email: &str,
) -> Email {
    let review_link = format!("{site_url}/dashboard/admin/edit/{}", listing.id);
    let state_line = match listing.status {
        ListingStatus::Pending => "is waiting for review.",
        ListingStatus::Live => "is already live on a paid plan.",
        ListingStatus::Rejected => "was updated while rejected.",
    };
    let subject = if is_edit {
        format!("Listing Updated (Review): {}", listing.listing_name)
    } else {
        format!("New Listing Submission: {}", listing.listing_name)
    };

    Email {
        to: vec![admin_email.to_string()],
        subject,
        html: wrap(&format!(
            r#"<p><strong>{}</strong> {state_line}</p><p><a href="{review_link}">Review listing</a></p>"#,
            escape_html(&listing.listing_name)
        )),
        reply_to: None,
    }
}

pub fn listing_live_email(listing: &Listing, site_url: &str, reply_to: &str) -> Option<Email> {
    let to = recipient(listing)?;
    let name = escape_html(&listing.listing_name);
    let listing_url = format!("{site_url}/listing/{}", listing.slug);
    let claim_url = format!("{site_url}/claim-upgrade/{}?lid={}", listing.slug, listing.id);
    let manage_url = format!("{site_url}/dashboard/vendor?lid={}", listing.id);

    let mut body = format!(
        r#"<h2>Your listing is live</h2><p><strong>{name}</strong> is now visible in the directory: <a href="{listing_url}">{listing_url}</a></p>"#
    );
    if listing.owner_id.is_none() {
        body.push_str(&format!(
            r#"<p><a href="{claim_url}">Claim your listing</a> to keep it up to date, or upgrade for more visibility.</p>"#
        ));
    } else {
        body.push_str(&format!(
            r#"<p><a href="{claim_url}">Upgrade your plan</a> or <a href="{manage_url}">manage your listing</a>.</p>"#
        ));
    }

    Some(Email {
        to: vec![to],
        subject: format!("Your listing is live: {}", listing.listing_name),
        html: wrap(&body),
        reply_to: Some(reply_to.to_string()),
    })
}

pub fn listing_claimed_email(
    listing: &Listing,
    claimer_email: Option<&str>,
    site_url: &str,
    admin_email: &str,
) -> Email {
    let review_link = format!("{site_url}/dashboard/admin/edit/{}", listing.id);
    let by = claimer_email
        .map(|email| format!(" by {}", escape_html(email)))
        .unwrap_or_default();

    Email {
        to: vec![admin_email.to_string()],
        subject: format!("Listing Claimed: {}", listing.listing_name),
        html: wrap(&format!(
            r#"<h2>Listing Claimed</h2><p><strong>{}</strong> was just claimed{by}.</p><p><a href="{review_link}">Review listing</a></p>"#,
            escape_html(&listing.listing_name)
        )),
        reply_to: None,
    }
}

/// `None` unless the application carries a final decision.
pub fn badge_decision_email(
    application: &BadgeApplication,
    vendor_email: &str,
    site_url: &str,
) -> Option<Email> {
    let dashboard = format!("{site_url}/dashboard/vendor/badge-application");
    let notes = application
        .admin_notes
        .as_deref()
        .map(|notes| format!("<p>Notes from our team: {}</p>", escape_html(notes)))
        .unwrap_or_default();

    let (subject, body) = match application.status {
        BadgeApplicationStatus::Approved => (
            "Your 101 Badge application was approved",
            format!("<h2>Congratulations!</h2><p>Your listing now shows the Child Actor 101 badge.</p>{notes}"),
        ),
        BadgeApplicationStatus::Rejected => (
            "Update on your 101 Badge application",
            format!(
                r#"<h2>Application not approved</h2>{notes}<p>You can update your documents and reapply from <a href="{dashboard}">your dashboard</a>.</p>"#
            ),
        ),
        _ => return None,
    };

    Some(Email {
        to: vec![vendor_email.to_string()],
        subject: subject.to_string(),
        html: wrap(&body),
        reply_to: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::listing_named;

    const SITE: &str = "https://directory.example.com";

    #[test]
    fn submission_subjects_follow_edit_flag() {
        let mut listing = listing_named("Jane Doe Photography", "Free", ListingStatus::Pending);
        listing.email = Some("jane@example.com".into());

        let vendor = vendor_submission_email(&listing, false, "admin@example.com").unwrap();
        assert_eq!(vendor.subject, "Listing Submitted: Jane Doe Photography");
        assert_eq!(vendor.to, vec!["jane@example.com".to_string()]);

        let admin = admin_submission_email(&listing, true, SITE, "admin@example.com");
        assert_eq!(admin.subject, "Listing Updated (Review): Jane Doe Photography");
        assert!(admin.html.contains(&format!("{SITE}/dashboard/admin/edit/{}", listing.id)));
    }

    #[test]
    fn admin_notice_reflects_listing_status() {
        let pending = listing_named("Jane Doe Photography", "Free", ListingStatus::Pending);
        let admin = admin_submission_email(&pending, false, SITE, "admin@example.com");
        assert!(admin.html.contains("is waiting for review."));

        let live = listing_named("Studio West", "Pro", ListingStatus::Live);
        let admin = admin_submission_email(&live, false, SITE, "admin@example.com");
        assert!(admin.html.contains("is already live"));
        assert!(!admin.html.contains("waiting for review"));
    }

    #[test]
    fn live_email_carries_claim_link_and_needs_recipient() {
        let mut listing = listing_named("Studio <West>", "Free", ListingStatus::Live);
        assert!(listing_live_email(&listing, SITE, "a@b.c").is_none());

        listing.email = Some("hello@studiowest.com".into());
        let email = listing_live_email(&listing, SITE, "a@b.c").unwrap();
        assert_eq!(email.subject, "Your listing is live: Studio <West>");
        assert!(email.html.contains("Studio &lt;West&gt;"));
        assert!(email
            .html
            .contains(&format!("{SITE}/claim-upgrade/{}?lid={}", listing.slug, listing.id)));
    }

    #[test]
    fn badge_email_only_for_decisions() {
        let mut application = BadgeApplication::new_draft(uuid::Uuid::new_v4());
        assert!(badge_decision_email(&application, "v@x.com", SITE).is_none());

        application.status = BadgeApplicationStatus::Rejected;
        application.admin_notes = Some("Need a signed reference".into());
        let email = badge_decision_email(&application, "v@x.com", SITE).unwrap();
        assert!(email.html.contains("Need a signed reference"));
    }
}
