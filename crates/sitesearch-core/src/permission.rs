//! Permission code dropdown.
//!
//! A single-select field whose options are every permission code the
//! authorization source knows about, hidden codes included.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use crate::store::PermissionSource;

#[derive(Debug, Clone, Serialize)]
pub struct PermissionDropdownField {
    pub name: String,
    pub title: String,
    /// Permission code → label.
    pub options: BTreeMap<String, String>,
}

impl PermissionDropdownField {
    pub async fn new<P>(name: &str, title: &str, source: &P) -> Result<Self>
    where
        P: PermissionSource + ?Sized,
    {
        let options = source.list_codes(true).await?;
        Ok(Self {
            name: name.to_string(),
            title: title.to_string(),
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PermissionCode;
    use crate::store::memory::InMemorySite;

    #[tokio::test]
    async fn test_options_include_hidden_codes() {
        let mut site = InMemorySite::new();
        site.insert_permission(PermissionCode {
            code: "CMS_ACCESS".into(),
            label: "Access to the CMS".into(),
            hidden: false,
        });
        site.insert_permission(PermissionCode {
            code: "ADMIN".into(),
            label: "Full administrative rights".into(),
            hidden: true,
        });

        let field = PermissionDropdownField::new("Code", "", &site).await.unwrap();
        assert_eq!(field.name, "Code");
        assert_eq!(field.title, "");
        assert_eq!(field.options.len(), 2);
        assert_eq!(
            field.options.get("ADMIN").map(String::as_str),
            Some("Full administrative rights")
        );
        assert!(!field.options.contains_key("NOPE"));
    }
}
