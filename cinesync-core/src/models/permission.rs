//! Rank-threshold permission table for one channel.
//!
//! The node catalog is closed: it is fixed at build time and user input can
//! never grow it. Nodes prefixed `o` are the shadow variants of their
//! playlist-prefixed base node, consulted only while the playlist is open.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::rank::Rank;

/// Default thresholds for every catalog node.
pub const DEFAULT_PERMISSIONS: &[(&str, f64)] = &[
    ("seeplaylist", -1.0),        // See the playlist
    ("playlistadd", 1.0),         // Add video to the playlist
    ("playlistnext", 2.0),        // Add a video next on the playlist
    ("playlistmove", 4.5),        // Move a video on the playlist
    ("playlistdelete", 5.0),      // Delete a video from the playlist
    ("playlistjump", 4.5),        // Start a different video on the playlist
    ("playlistaddlist", 6.0),     // Add a list of videos to the playlist
    ("oplaylistadd", -1.0),       // Same as above, but for open (unlocked) playlist
    ("oplaylistnext", 1.0),
    ("oplaylistmove", 4.5),
    ("oplaylistdelete", 5.0),
    ("oplaylistjump", 4.5),
    ("oplaylistaddlist", 6.0),
    ("playlistaddcustom", 7.0),   // Add custom embed to the playlist
    ("playlistaddrawfile", 8.0),  // Add raw file to the playlist
    ("playlistaddlive", 5.0),     // Add a livestream to the playlist
    ("exceedmaxlength", 3.0),     // Add a video longer than the maximum length set
    ("addnontemp", 7.0),          // Add a permanent video to the playlist
    ("settemp", 7.0),             // Toggle temporary status of a playlist item
    ("playlistshuffle", 10.0),    // Shuffle the playlist
    ("playlistclear", 7.0),       // Clear the playlist
    ("pollctl", 5.0),             // Open/close polls
    ("pollvote", 1.0),            // Vote in polls
    ("viewhiddenpoll", 4.5),      // View results of hidden polls
    ("voteskip", 1.0),            // Vote to skip the current video
    ("viewvoteskip", 5.0),        // View voteskip results
    ("mute", 5.0),                // Mute other users
    ("kick", 5.0),                // Kick other users
    ("ban", 6.0),                 // Ban other users
    ("motdedit", 10.0),           // Edit the MOTD
    ("filteredit", 10.0),         // Control chat filters
    ("filterimport", 10.0),       // Import chat filter list
    ("emoteedit", 9.0),           // Control emotes
    ("emoteimport", 9.0),         // Import emote list
    ("playlistlock", 8.0),        // Lock/unlock the playlist
    ("leaderctl", 5.0),           // Give/take leader
    ("drink", 100.0),             // Use the /d command
    ("chat", 1.0),                // Send chat messages
    ("chatclear", 5.0),           // Use the /clear command
    ("exceedmaxitems", 3.0),      // Exceed maximum items per user limit
    ("deletefromchannellib", 5.0), // Delete channel library items
    ("exceedmaxdurationperuser", 4.0), // Exceed maximum total playlist length per user
];

/// Thresholds for channels running without persistent identity. Catalog
/// nodes absent here are unattainable in that mode.
const UNREGISTERED_PERMISSIONS: &[(&str, f64)] = &[
    ("seeplaylist", 4.0),
    ("playlistadd", 4.0),
    ("playlistnext", 4.0),
    ("playlistmove", 4.5),
    ("playlistdelete", 4.5),
    ("playlistjump", 4.5),
    ("playlistaddlist", 4.0),
    ("oplaylistadd", 4.0),
    ("oplaylistnext", 4.0),
    ("oplaylistmove", 4.0),
    ("oplaylistdelete", 4.0),
    ("oplaylistjump", 4.0),
    ("oplaylistaddlist", 4.0),
    ("playlistaddcustom", 4.0),
    ("playlistaddlive", 4.0),
    ("exceedmaxlength", 4.0),
    ("addnontemp", 5.0),
    ("settemp", 5.0),
    ("playlistshuffle", 5.0),
    ("playlistclear", 6.0),
    ("pollctl", 4.5),
    ("pollvote", 2.0),
    ("viewhiddenpoll", 4.5),
    ("voteskip", 2.0),
    ("viewvoteskip", 4.5),
    ("playlistlock", 5.0),
    ("leaderctl", 5.0),
    ("drink", 100.0),
    ("chat", 2.0),
    ("chatclear", 5.0),
    ("exceedmaxitems", 4.0),
    ("deletefromchannellib", 4.0),
];

/// Look up a catalog node by name, yielding its canonical `'static` key.
#[must_use]
pub fn catalog_node(name: &str) -> Option<&'static str> {
    DEFAULT_PERMISSIONS
        .iter()
        .find(|(node, _)| *node == name)
        .map(|(node, _)| *node)
}

/// Default threshold for a catalog node.
#[must_use]
pub fn default_threshold(name: &str) -> Option<Rank> {
    DEFAULT_PERMISSIONS
        .iter()
        .find(|(node, _)| *node == name)
        .map(|(_, value)| Rank(*value))
}

/// Total coercion of a proposed threshold value.
///
/// Accepts JSON numbers and numeric strings; everything else (and NaN) is
/// rejected. Negative and fractional thresholds are valid.
#[must_use]
pub fn parse_threshold(raw: &Value) -> Option<Rank> {
    let value = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if value.is_nan() {
        None
    } else {
        Some(Rank(value))
    }
}

/// Node name -> rank threshold mapping for one channel, plus the
/// open-playlist flag and the persistence dirty flag.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    permissions: HashMap<&'static str, Rank>,
    open_playlist: bool,
    dirty: bool,
}

impl PermissionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table with the merge of catalog defaults and a persisted
    /// blob. Unknown persisted keys are ignored; persisted values that fail
    /// numeric coercion fall back to the catalog default.
    pub fn load(&mut self, data: &Value) {
        let preset = data.get("permissions").and_then(Value::as_object);

        self.permissions.clear();
        for &(node, default) in DEFAULT_PERMISSIONS {
            let threshold = preset
                .and_then(|p| p.get(node))
                .and_then(parse_threshold)
                .unwrap_or(Rank(default));
            self.permissions.insert(node, threshold);
        }

        if let Some(open) = data.get("openPlaylist").and_then(Value::as_bool) {
            self.open_playlist = open;
        } else if let Some(locked) = data.get("playlistLock").and_then(Value::as_bool) {
            // Legacy field with the inverse meaning
            self.open_playlist = !locked;
        }

        self.dirty = false;
    }

    /// Serialize the table into the channel blob. Pure serialization, no
    /// validation.
    pub fn save(&self, data: &mut Map<String, Value>) {
        data.insert(
            "permissions".to_string(),
            Value::Object(self.permissions_json()),
        );
        data.insert("openPlaylist".to_string(), Value::Bool(self.open_playlist));
    }

    /// Initialize for a channel running without persistent identity: the
    /// distinct unregistered-mode thresholds, with the playlist forced open.
    /// Catalog nodes the unregistered table does not name get
    /// [`Rank::UNATTAINABLE`]. Tables in this mode are never persisted.
    pub fn load_unregistered(&mut self) {
        for &(node, _) in DEFAULT_PERMISSIONS {
            self.permissions.insert(node, Rank::UNATTAINABLE);
        }
        for &(node, value) in UNREGISTERED_PERMISSIONS {
            self.permissions.insert(node, Rank(value));
        }
        self.open_playlist = true;
    }

    /// Threshold for a node; `None` for anything outside the catalog or
    /// before `load` ran.
    #[must_use]
    pub fn threshold(&self, node: &str) -> Option<Rank> {
        self.permissions.get(node).copied()
    }

    /// Overwrite one node's threshold. Returns false (and stores nothing)
    /// for keys outside the catalog.
    pub fn set_threshold(&mut self, node: &str, threshold: Rank) -> bool {
        match catalog_node(node) {
            Some(node) => {
                self.permissions.insert(node, threshold);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn open_playlist(&self) -> bool {
        self.open_playlist
    }

    /// Flip the open-playlist flag, returning the new value.
    pub fn toggle_open_playlist(&mut self) -> bool {
        self.open_playlist = !self.open_playlist;
        self.dirty = true;
        self.open_playlist
    }

    #[must_use]
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// The full node -> number mapping in catalog order, as pushed to
    /// clients and as written by `save`. Non-finite thresholds (unregistered
    /// mode only) have no JSON form and serialize as null; they reload as
    /// the catalog default, which is fine because unregistered tables are
    /// never persisted.
    #[must_use]
    pub fn permissions_json(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for &(node, _) in DEFAULT_PERMISSIONS {
            if let Some(rank) = self.permissions.get(node) {
                let value = serde_json::Number::from_f64(rank.0)
                    .map_or(Value::Null, Value::Number);
                map.insert(node.to_string(), value);
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_shadow_nodes_pair_with_base() {
        for (node, _) in DEFAULT_PERMISSIONS {
            if let Some(base) = node.strip_prefix('o') {
                if base.starts_with("playlist") {
                    assert!(catalog_node(base).is_some(), "shadow {node} lacks base");
                }
            }
        }
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold(&json!(3)), Some(Rank(3.0)));
        assert_eq!(parse_threshold(&json!(4.5)), Some(Rank(4.5)));
        assert_eq!(parse_threshold(&json!(-1)), Some(Rank(-1.0)));
        assert_eq!(parse_threshold(&json!("3")), Some(Rank(3.0)));
        assert_eq!(parse_threshold(&json!(" 4.5 ")), Some(Rank(4.5)));
        assert_eq!(parse_threshold(&json!("notanumber")), None);
        assert_eq!(parse_threshold(&json!(true)), None);
        assert_eq!(parse_threshold(&json!(null)), None);
        assert_eq!(parse_threshold(&json!({})), None);
        assert_eq!(parse_threshold(&json!("NaN")), None);
    }

    #[test]
    fn test_load_empty_blob_yields_defaults() {
        let mut table = PermissionTable::new();
        table.load(&json!({}));

        for &(node, default) in DEFAULT_PERMISSIONS {
            assert_eq!(table.threshold(node), Some(Rank(default)), "node {node}");
            assert_eq!(default_threshold(node), Some(Rank(default)));
        }
        assert!(!table.open_playlist());
        assert!(!table.dirty());
    }

    #[test]
    fn test_load_merges_persisted_over_defaults() {
        let mut table = PermissionTable::new();
        table.load(&json!({"permissions": {"chat": 3}}));

        assert_eq!(table.threshold("chat"), Some(Rank(3.0)));
        // everything else stays at its default
        assert_eq!(table.threshold("ban"), Some(Rank(6.0)));
        assert_eq!(table.threshold("playlistadd"), Some(Rank(1.0)));
    }

    #[test]
    fn test_load_ignores_unknown_keys() {
        let mut table = PermissionTable::new();
        table.load(&json!({"permissions": {"doesnotexist": 1}}));
        assert_eq!(table.threshold("doesnotexist"), None);
    }

    #[test]
    fn test_load_coerces_bad_values_to_default() {
        let mut table = PermissionTable::new();
        table.load(&json!({"permissions": {"chat": "oops", "ban": "7"}}));
        assert_eq!(table.threshold("chat"), Some(Rank(1.0)));
        assert_eq!(table.threshold("ban"), Some(Rank(7.0)));
    }

    #[test]
    fn test_load_resolves_open_playlist() {
        let mut table = PermissionTable::new();
        table.load(&json!({"openPlaylist": true}));
        assert!(table.open_playlist());

        // explicit field wins over legacy playlistLock
        table.load(&json!({"openPlaylist": false, "playlistLock": false}));
        assert!(!table.open_playlist());

        // legacy field has the inverse meaning
        table.load(&json!({"playlistLock": false}));
        assert!(table.open_playlist());

        // neither field present: prior value survives the reload
        table.load(&json!({}));
        assert!(table.open_playlist());
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut table = PermissionTable::new();
        table.load(&json!({"permissions": {"chat": 3, "playlistmove": 4.5}}));
        table.toggle_open_playlist();
        assert!(table.dirty());

        let mut blob = Map::new();
        table.save(&mut blob);

        let mut restored = PermissionTable::new();
        restored.load(&Value::Object(blob));

        for &(node, _) in DEFAULT_PERMISSIONS {
            assert_eq!(restored.threshold(node), table.threshold(node), "node {node}");
        }
        assert_eq!(restored.open_playlist(), table.open_playlist());
        assert!(!restored.dirty());
    }

    #[test]
    fn test_set_threshold_rejects_unknown_nodes() {
        let mut table = PermissionTable::new();
        table.load(&json!({}));
        assert!(table.set_threshold("chat", Rank(2.0)));
        assert!(!table.set_threshold("unknownnode", Rank(2.0)));
        assert_eq!(table.threshold("unknownnode"), None);
    }

    #[test]
    fn test_unregistered_defaults() {
        let mut table = PermissionTable::new();
        table.load_unregistered();

        assert!(table.open_playlist());
        assert_eq!(table.threshold("playlistadd"), Some(Rank(4.0)));
        assert_eq!(table.threshold("chat"), Some(Rank(2.0)));
        // nodes with no unregistered entry are unattainable
        assert_eq!(table.threshold("ban"), Some(Rank::UNATTAINABLE));
        assert_eq!(table.threshold("motdedit"), Some(Rank::UNATTAINABLE));
    }
}
