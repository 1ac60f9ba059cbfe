use serde::{Deserialize, Serialize};

/// Scheme shown by the portal before any directive arrives
pub const DEFAULT_SCHEME: &str = "PM Awas Yojana";

/// One input on a scheme's application form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    pub placeholder: String,
}

/// Presentation and field schema of a welfare scheme's application form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeTemplate {
    pub title: String,
    pub subtitle: String,
    /// Accent color, `#rrggbb`
    pub theme_color: String,
    /// Header background color, `#rrggbb`
    pub header_color: String,
    pub fields: Vec<FieldSpec>,
}

impl SchemeTemplate {
    /// Returns true if the form declares a field with this key
    pub fn declares(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }
}

/// Read-only catalog of scheme templates keyed by scheme name
#[derive(Debug, Clone)]
pub struct SchemeCatalog {
    entries: Vec<(String, SchemeTemplate)>,
}

fn field(key: &str, label: &str, placeholder: &str) -> FieldSpec {
    FieldSpec {
        key: key.to_string(),
        label: label.to_string(),
        placeholder: placeholder.to_string(),
    }
}

fn template(
    title: &str,
    subtitle: &str,
    theme_color: &str,
    header_color: &str,
    fields: Vec<FieldSpec>,
) -> SchemeTemplate {
    SchemeTemplate {
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        theme_color: theme_color.to_string(),
        header_color: header_color.to_string(),
        fields,
    }
}

impl SchemeCatalog {
    /// The five schemes the demo portal knows about
    pub fn builtin() -> Self {
        let entries = vec![
            (
                "PM Awas Yojana".to_string(),
                template(
                    "Pradhan Mantri Awas Yojana",
                    "Housing for All (Urban/Rural)",
                    "#005a9c",
                    "#003366",
                    vec![
                        field("aadhar", "Aadhar Number", "XXXX-XXXX-XXXX"),
                        field("income", "Monthly Family Income (₹)", "e.g. 15000"),
                        field("land_status", "Land Ownership (Yes/No)", "e.g. Yes"),
                    ],
                ),
            ),
            (
                "PM Kisan".to_string(),
                template(
                    "PM-Kisan Samman Nidhi",
                    "Direct Benefit Transfer for Farmers",
                    "#2e7d32",
                    "#1b5e20",
                    vec![
                        field("aadhar", "Aadhar Card Number", "XXXX-XXXX-XXXX"),
                        field("farmer_id", "Kisan Credit Card / Farmer ID", "e.g. FID-9908"),
                        field("bank_account", "Bank Account Number", "e.g. 3099XXXXXXXX"),
                    ],
                ),
            ),
            (
                "Ladli Behna".to_string(),
                template(
                    "Mukhyamantri Ladli Behna Yojana",
                    "Women Empowerment Mission",
                    "#c2185b",
                    "#880e4f",
                    vec![
                        field("aadhar", "Samagra Aadhar Number", "XXXX-XXXX-XXXX"),
                        field("samagra_id", "Samagra Member ID", "e.g. 192837465"),
                        field("bank_account", "Bank Account No.", "e.g. 5010XXXXXXXX"),
                    ],
                ),
            ),
            (
                "Swasthya Sathi".to_string(),
                template(
                    "Swasthya Sathi Card Portal",
                    "Universal Health Coverage Scheme",
                    "#0288d1",
                    "#01579b",
                    vec![
                        field("aadhar", "Head of Family Aadhar", "XXXX-XXXX-XXXX"),
                        field("ration_card", "Ration Card Number (Digital)", "e.g. R-102837"),
                        field("family_count", "Total Family Members", "e.g. 4"),
                    ],
                ),
            ),
            (
                "Old Age Pension".to_string(),
                template(
                    "NSAP Old Age Pension",
                    "Financial Assistance for Senior Citizens",
                    "#ef6c00",
                    "#e65100",
                    vec![
                        field("aadhar", "Aadhar Number", "XXXX-XXXX-XXXX"),
                        field("age_proof", "Age Proof Document Type", "e.g. Birth Certificate"),
                        field("bank_ifsc", "Bank IFSC Code", "e.g. SBIN000XXXX"),
                    ],
                ),
            ),
        ];
        Self { entries }
    }

    /// Looks up a template by exact scheme name
    pub fn get(&self, scheme: &str) -> Option<&SchemeTemplate> {
        self.entries
            .iter()
            .find(|(name, _)| name == scheme)
            .map(|(_, template)| template)
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.get(scheme).is_some()
    }

    /// Scheme names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemeTemplate)> {
        self.entries.iter().map(|(name, t)| (name.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SchemeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_has_five_schemes() {
        let catalog = SchemeCatalog::builtin();
        assert_eq!(catalog.len(), 5);
        assert!(catalog.contains(DEFAULT_SCHEME));
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec![
                "PM Awas Yojana",
                "PM Kisan",
                "Ladli Behna",
                "Swasthya Sathi",
                "Old Age Pension"
            ]
        );
    }

    #[test]
    fn test_lookup_is_exact() {
        let catalog = SchemeCatalog::builtin();
        let kisan = catalog.get("PM Kisan").unwrap();
        assert_eq!(kisan.title, "PM-Kisan Samman Nidhi");
        assert!(kisan.declares("bank_account"));
        assert!(!kisan.declares("income"));
        assert!(catalog.get("pm kisan").is_none());
        assert!(catalog.get("Free Laptop Yojana").is_none());
    }
}
