fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use ahavault_protocol::{
        AuthPayload, CreateShareRequest, CreatedShare, Envelope, FileItem, FileListPage,
        SaveToVaultRequest, SavedToVault, ShareInfo, ShareStatus, SharesPage, User,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Normalizes JSON values so that integer-valued floats compare equal.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a value into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent, number-normalized comparison).
    fn assert_roundtrip<T>(name: &str, value: serde_json::Value)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let parsed: T = serde_json::from_value(value.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            normalize_value(&value),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  server: {value}\n  client: {reserialized}"
        );
    }

    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        assert_roundtrip::<T>(name, load_fixture(name));
    }

    // --- Auth ---

    #[test]
    fn fixture_auth_payload() {
        roundtrip_test::<AuthPayload>("auth_payload.json");
    }

    #[test]
    fn auth_payload_without_role_gets_default() {
        let json = r#"{"user_id":"u1","email":"a@b.c","token":"t"}"#;
        let payload: AuthPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.expires_in, 0);
        let (user, token) = payload.into_parts();
        assert_eq!(user.role, "user");
        assert_eq!(token, "t");
    }

    #[test]
    fn fixture_session_file() {
        roundtrip_test::<ahavault_session::AuthSession>("session.json");
    }

    #[test]
    fn stored_user_without_role_gets_default() {
        let user: User = serde_json::from_str(r#"{"user_id":"u1","email":"a@b.c"}"#).unwrap();
        assert_eq!(user.role, "user");
    }

    // --- Cabinet ---

    #[test]
    fn fixture_file_list_page() {
        roundtrip_test::<FileListPage>("file_list_page.json");
    }

    #[test]
    fn sparse_file_item_uses_defaults() {
        let json = r#"{
            "id": "f-9",
            "filename": "notes.txt",
            "size": 12,
            "created_at": "2026-02-05T18:00:00+08:00"
        }"#;
        let item: FileItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.mime_type, "");
        assert!(!item.is_shared);
        assert_eq!(item.share_count, 0);
        assert_eq!(item.created_at.to_rfc3339(), "2026-02-05T10:00:00+00:00");
    }

    #[test]
    fn empty_file_list_page() {
        let page: FileListPage = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    // --- Shares ---

    #[test]
    fn fixture_create_share_request() {
        roundtrip_test::<CreateShareRequest>("create_share_request.json");
    }

    #[test]
    fn fixture_created_share() {
        roundtrip_test::<CreatedShare>("created_share.json");
    }

    #[test]
    fn fixture_shares_page() {
        roundtrip_test::<SharesPage>("shares_page.json");
    }

    #[test]
    fn shares_page_statuses() {
        let page: SharesPage = serde_json::from_value(load_fixture("shares_page.json")).unwrap();
        let now = "2026-02-06T00:00:00Z".parse().unwrap();
        assert_eq!(page.shares[0].status_at(now), ShareStatus::Active);
        assert_eq!(page.shares[0].remaining_downloads(), Some(4));
        assert_eq!(page.shares[1].status_at(now), ShareStatus::Stopped);
        assert_eq!(page.shares[1].remaining_downloads(), None);
    }

    #[test]
    fn fixture_save_to_vault() {
        let fixture = load_fixture("save_to_vault.json");
        assert_roundtrip::<SaveToVaultRequest>(
            "save_to_vault.json#request",
            fixture["request"].clone(),
        );
        assert_roundtrip::<SavedToVault>(
            "save_to_vault.json#response",
            fixture["response"].clone(),
        );
    }

    // --- Pickup ---

    #[test]
    fn fixture_share_info() {
        roundtrip_test::<ShareInfo>("share_info.json");
    }

    #[test]
    fn lookup_envelope_unwraps_share() {
        let env: Envelope = serde_json::from_str(&read_fixture("lookup_envelope.json")).unwrap();
        assert!(env.is_ok());
        let share: ShareInfo = env.parse_data().unwrap().unwrap();
        assert_eq!(share.files.len(), 1);
        assert!(share.is_unlimited());
        assert_eq!(share.requires_password, None);
        assert_eq!(share.total_size(), 1536);
    }

    #[test]
    fn password_required_envelope() {
        let env: Envelope = serde_json::from_str(&read_fixture("password_required.json")).unwrap();
        assert!(!env.is_ok());
        assert_eq!(env.code, ahavault_protocol::constants::CODE_PASSWORD_REQUIRED);
        assert_eq!(env.message, "Password required");
        assert!(env.parse_data::<ShareInfo>().unwrap().is_none());
        assert!(env.data_value().is_none());
    }

    #[test]
    fn lookup_request_omits_absent_password() {
        let req = ahavault_protocol::LookupRequest::default();
        assert_eq!(serde_json::to_string(&req).unwrap(), "{}");
    }

    // --- Uploads ---

    #[test]
    fn fixture_resume_records() {
        roundtrip_test::<Vec<ahavault_transfer::PreviousUpload>>("resume_records.json");
    }

    #[test]
    fn resume_record_without_filename() {
        let json = r#"[{
            "fingerprint": "ab",
            "upload_url": "http://h/api/tus/upload/1",
            "size": 10,
            "created_at": "2026-02-05T10:00:00Z"
        }]"#;
        let records: Vec<ahavault_transfer::PreviousUpload> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].filename, "");
    }
}
