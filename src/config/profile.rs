//! Manually selected user profiles

use serde::{Deserialize, Serialize};

use super::common::{AutoOff, MotionGate};
use super::items::{ModeItem, Segments};
use crate::collection::{BoundedVec, IdPolicy};
use crate::consts::MAX_USER_PROFILES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfileItem {
    pub profile_id: u16,
    pub profile_no: u16,
    pub name: String,
    pub enabled: bool,
    pub repeat_segments: bool,
    pub repeat_count: u8,
    pub segments: Segments,
    pub auto_off: AutoOff,
    pub motion: MotionGate,
}

impl Default for UserProfileItem {
    fn default() -> Self {
        Self {
            profile_id: 0,
            profile_no: 0,
            name: String::new(),
            enabled: true,
            repeat_segments: true,
            repeat_count: 0,
            segments: Segments::new(),
            auto_off: AutoOff::default(),
            motion: MotionGate::default(),
        }
    }
}

impl ModeItem for UserProfileItem {
    const COLLECTION: &'static str = "userProfiles";
    const ID_FIELD: &'static str = "profileId";
    const NUMBER_FIELD: &'static str = "profileNo";
    const WRAPPER: &'static str = "profile";
    const IDS: IdPolicy = IdPolicy { start: 1, step: 1 };

    fn id(&self) -> u16 {
        self.profile_id
    }

    fn set_id(&mut self, id: u16) {
        self.profile_id = id;
    }

    fn number(&self) -> u16 {
        self.profile_no
    }

    fn segments(&self) -> &Segments {
        &self.segments
    }

    fn segments_mut(&mut self) -> &mut Segments {
        &mut self.segments
    }
}

/// Body of the `userProfiles` section: `{ "profiles": [...] }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfilesRoot {
    pub profiles: BoundedVec<UserProfileItem, MAX_USER_PROFILES>,
}

impl UserProfilesRoot {
    pub fn find(&self, profile_id: u16) -> Option<&UserProfileItem> {
        self.profiles.iter().find(|item| item.profile_id == profile_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::items::{add_item, item_from_json, remove_item};
    use crate::error::ConfigError;
    use serde_json::json;

    fn profile(no: u16) -> UserProfileItem {
        UserProfileItem {
            profile_no: no,
            ..Default::default()
        }
    }

    #[test]
    fn test_profile_ids_step_by_one() {
        let mut root = UserProfilesRoot::default();
        assert_eq!(add_item(&mut root.profiles, profile(3)).unwrap(), 1);
        assert_eq!(add_item(&mut root.profiles, profile(4)).unwrap(), 2);
        remove_item(&mut root.profiles, 2).unwrap();
        assert_eq!(add_item(&mut root.profiles, profile(5)).unwrap(), 2);
    }

    #[test]
    fn test_bare_json_body_accepted() {
        let body = json!({"profileId": 40, "profileNo": 2, "name": "sleep"});
        let item: UserProfileItem = item_from_json(&body).unwrap();
        assert_eq!(item.name, "sleep");

        let mut root = UserProfilesRoot::default();
        assert_eq!(add_item(&mut root.profiles, item).unwrap(), 1);
        assert!(root.find(40).is_none());
    }

    #[test]
    fn test_non_object_body_rejected() {
        let result: Result<UserProfileItem, _> = item_from_json(&json!([1, 2]));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_section_body_shape() {
        let root: UserProfilesRoot =
            serde_json::from_value(json!({"profiles": [{"profileId": 1, "profileNo": 1}]})).unwrap();
        assert_eq!(root.profiles.len(), 1);
        assert!(root.find(1).is_some_and(|p| p.enabled));
    }
}
