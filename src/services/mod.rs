pub mod badges;
pub mod directory;
pub mod moderation;
pub mod submission;

use uuid::Uuid;

use crate::clients::PageCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Admin,
    Vendor,
    Parent,
}

impl std::str::FromStr for ActorRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(ActorRole::Admin),
            "vendor" => Ok(ActorRole::Vendor),
            "parent" => Ok(ActorRole::Parent),
            other => Err(format!("Unknown actor role '{other}'")),
        }
    }
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
    pub email: Option<String>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }
}

/// Best-effort page invalidation.
pub(crate) async fn revalidate<I, S>(pages: &dyn PageCache, paths: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
    if let Err(err) = pages.revalidate(&paths).await {
        log::warn!("Failed to revalidate {paths:?}: {err}");
    }
}

pub(crate) fn listing_path(slug: &str) -> String {
    format!("/listing/{slug}")
}
