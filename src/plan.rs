use serde::{Deserialize, Serialize};

/// Subscription plan a vendor picks on the submit form
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Plan {
    Free,
    Standard,
    Pro,
    #[serde(rename = "Founding Standard")]
    FoundingStandard,
    #[serde(rename = "Founding Pro")]
    FoundingPro,
}

impl Plan {
    pub fn label(&self) -> &'static str {
        match self {
            Plan::Free => "Free",
            Plan::Standard => "Standard",
            Plan::Pro => "Pro",
            Plan::FoundingStandard => "Founding Standard",
            Plan::FoundingPro => "Founding Pro",
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, Plan::Free)
    }

    pub fn tier(&self) -> ListingTier {
        match self {
            Plan::Free => ListingTier::Free,
            Plan::Standard | Plan::FoundingStandard => ListingTier::Standard,
            Plan::Pro | Plan::FoundingPro => ListingTier::Pro,
        }
    }

    pub fn max_gallery_images(&self) -> usize {
        match self.tier() {
            ListingTier::Free => 0,
            ListingTier::Standard => 1,
            ListingTier::Pro => 4,
        }
    }

    /// `None` means unlimited.
    pub fn max_categories(&self) -> Option<usize> {
        match self.tier() {
            ListingTier::Free => Some(1),
            _ => None,
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .trim()
            .to_ascii_lowercase()
            .replace(['_', '-'], " ");
        match normalized.as_str() {
            "free" => Ok(Plan::Free),
            "standard" => Ok(Plan::Standard),
            "pro" => Ok(Plan::Pro),
            "founding standard" => Ok(Plan::FoundingStandard),
            "founding pro" => Ok(Plan::FoundingPro),
            _ => Err(format!("plan: Unknown plan '{}'", value.trim())),
        }
    }
}

/// Effective display tier of a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ListingTier {
    Free,
    Standard,
    Pro,
}

/// Sort weight for the moderation table. Higher sorts first.
pub fn plan_priority(plan: Option<&str>, comped: bool) -> u8 {
    if comped {
        return 3;
    }
    let plan = plan.map(|p| p.trim().to_ascii_lowercase()).unwrap_or_default();
    match plan.as_str() {
        "pro" | "founding pro" => 3,
        "standard" | "founding standard" => 2,
        "free" => 1,
        _ => 0,
    }
}

/// Free-text plan to tier. Comped listings get Pro.
pub fn tier_of(plan: Option<&str>, comped: bool) -> ListingTier {
    if comped {
        return ListingTier::Pro;
    }
    let plan = plan.map(|p| p.to_ascii_lowercase()).unwrap_or_default();
    if plan.contains("pro") || plan.contains("premium") {
        ListingTier::Pro
    } else if plan.contains("standard") {
        ListingTier::Standard
    } else {
        ListingTier::Free
    }
}

/// Who is looking at a listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Public,
    Admin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimaryCta {
    ViewProfile,
    VisitWebsite,
    ContactModal,
}

/// What a listing card or page may render as interactive
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capabilities {
    pub website_clickable: bool,
    pub socials_clickable: bool,
    pub email_clickable: bool,
    pub phone_clickable: bool,
    pub lead_form: bool,
    pub primary_cta: PrimaryCta,
}

pub fn capabilities(tier: ListingTier, viewer: Viewer) -> Capabilities {
    if viewer == Viewer::Admin {
        return Capabilities {
            website_clickable: true,
            socials_clickable: true,
            email_clickable: true,
            phone_clickable: true,
            lead_form: true,
            primary_cta: PrimaryCta::ContactModal,
        };
    }

    match tier {
        ListingTier::Free => Capabilities {
            website_clickable: false,
            socials_clickable: false,
            email_clickable: false,
            phone_clickable: false,
            lead_form: false,
            primary_cta: PrimaryCta::ViewProfile,
        },
        ListingTier::Standard => Capabilities {
            website_clickable: true,
            socials_clickable: true,
            email_clickable: false,
            phone_clickable: false,
            lead_form: false,
            primary_cta: PrimaryCta::VisitWebsite,
        },
        ListingTier::Pro => Capabilities {
            website_clickable: true,
            socials_clickable: true,
            email_clickable: true,
            phone_clickable: true,
            lead_form: true,
            primary_cta: PrimaryCta::ContactModal,
        },
    }
}

/// Harvest-resistant rendering of an address.
pub fn obfuscate_email(email: &str) -> String {
    email.replace('@', " [at] ").replace('.', " [dot] ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_labels_parse_case_insensitively() {
        assert_eq!("free".parse::<Plan>(), Ok(Plan::Free));
        assert_eq!(" PRO ".parse::<Plan>(), Ok(Plan::Pro));
        assert_eq!("Founding Standard".parse::<Plan>(), Ok(Plan::FoundingStandard));
        assert_eq!("founding_pro".parse::<Plan>(), Ok(Plan::FoundingPro));
        assert_eq!("founding-standard".parse::<Plan>(), Ok(Plan::FoundingStandard));
        assert!("gold".parse::<Plan>().is_err());
        assert!(!Plan::Free.is_paid());
        assert!(Plan::FoundingPro.is_paid());
    }

    #[test]
    fn priority_orders_pro_above_standard_above_free() {
        assert_eq!(plan_priority(Some("Pro"), false), 3);
        assert_eq!(plan_priority(Some("Founding Pro"), false), 3);
        assert_eq!(plan_priority(Some("standard"), false), 2);
        assert_eq!(plan_priority(Some("Founding Standard"), false), 2);
        assert_eq!(plan_priority(Some("Free"), false), 1);
        assert_eq!(plan_priority(None, false), 0);
        assert_eq!(plan_priority(Some("mystery"), false), 0);
        assert_eq!(plan_priority(Some("Free"), true), 3);
    }

    #[test]
    fn tier_follows_plan_text_and_comped_flag() {
        assert_eq!(tier_of(Some("Premium Annual"), false), ListingTier::Pro);
        assert_eq!(tier_of(Some("Founding Standard"), false), ListingTier::Standard);
        assert_eq!(tier_of(Some("Free"), false), ListingTier::Free);
        assert_eq!(tier_of(None, false), ListingTier::Free);
        assert_eq!(tier_of(None, true), ListingTier::Pro);
    }

    #[test]
    fn capabilities_match_tier_matrix() {
        let free = capabilities(ListingTier::Free, Viewer::Public);
        assert!(!free.website_clickable && !free.email_clickable);
        assert_eq!(free.primary_cta, PrimaryCta::ViewProfile);

        let standard = capabilities(ListingTier::Standard, Viewer::Public);
        assert!(standard.website_clickable && standard.socials_clickable);
        assert!(!standard.email_clickable);
        assert_eq!(standard.primary_cta, PrimaryCta::VisitWebsite);

        let pro = capabilities(ListingTier::Pro, Viewer::Public);
        assert!(pro.lead_form && pro.email_clickable);

        let admin = capabilities(ListingTier::Free, Viewer::Admin);
        assert!(admin.email_clickable && admin.website_clickable);
    }

    #[test]
    fn plan_limits() {
        assert_eq!(Plan::Free.max_gallery_images(), 0);
        assert_eq!(Plan::Standard.max_gallery_images(), 1);
        assert_eq!(Plan::FoundingPro.max_gallery_images(), 4);
        assert_eq!(Plan::Free.max_categories(), Some(1));
        assert_eq!(Plan::Pro.max_categories(), None);
    }

    #[test]
    fn email_obfuscation() {
        assert_eq!(
            obfuscate_email("john@example.com"),
            "john [at] example [dot] com"
        );
    }
}
