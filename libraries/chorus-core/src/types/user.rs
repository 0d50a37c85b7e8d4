/// Users and track requesters
use super::ids::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::OnceCell;

/// Live identity of a chat user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl UserProfile {
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar_url: None,
        }
    }
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// The user who queued a track
///
/// Serializes as the bare [`UserId`]. A requester restored from a snapshot
/// carries only the id; its profile is looked up on first access and cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "UserId", into = "UserId")]
pub struct Requester {
    id: UserId,
    profile: OnceCell<Option<UserProfile>>,
}

impl Requester {
    /// Requester whose live identity is already known
    pub fn resolved(profile: UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            profile: OnceCell::new_with(Some(Some(profile))),
        }
    }

    /// Requester known only by id (restored from a snapshot)
    pub fn unresolved(id: UserId) -> Self {
        Self {
            id,
            profile: OnceCell::new(),
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Cached profile, if it has been resolved already
    pub fn cached(&self) -> Option<&UserProfile> {
        self.profile.get().and_then(Option::as_ref)
    }

    /// Whether the profile lookup has happened (successfully or not)
    pub fn is_resolved(&self) -> bool {
        self.profile.initialized()
    }

    /// Resolve the live identity once, using `lookup` on first access
    pub async fn profile<F, Fut>(&self, lookup: F) -> Option<&UserProfile>
    where
        F: FnOnce(UserId) -> Fut,
        Fut: std::future::Future<Output = Option<UserProfile>>,
    {
        self.profile
            .get_or_init(|| lookup(self.id.clone()))
            .await
            .as_ref()
    }
}

impl PartialEq for Requester {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl From<UserId> for Requester {
    fn from(id: UserId) -> Self {
        Self::unresolved(id)
    }
}

impl From<Requester> for UserId {
    fn from(requester: Requester) -> Self {
        requester.id
    }
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cached() {
            Some(profile) => write!(f, "{}", profile),
            None => write!(f, "{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn requester_serializes_as_user_id() {
        let requester = Requester::resolved(UserProfile::new("77", "alice"));
        let json = serde_json::to_string(&requester).unwrap();
        assert_eq!(json, "\"77\"");

        let restored: Requester = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id().as_str(), "77");
        assert!(!restored.is_resolved());
        assert_eq!(restored, requester);
    }

    #[tokio::test]
    async fn profile_lookup_happens_once() {
        let calls = AtomicUsize::new(0);
        let requester = Requester::unresolved(UserId::new("5"));

        for _ in 0..3 {
            let profile = requester
                .profile(|id| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Some(UserProfile::new(id, "bob")) }
                })
                .await;
            assert_eq!(profile.map(|p| p.display_name.as_str()), Some("bob"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(requester.to_string(), "bob");
    }

    #[tokio::test]
    async fn resolved_requester_skips_lookup() {
        let requester = Requester::resolved(UserProfile::new("9", "carol"));
        let profile = requester
            .profile(|_| async { None })
            .await;
        assert_eq!(profile.map(|p| p.display_name.as_str()), Some("carol"));
    }
}
