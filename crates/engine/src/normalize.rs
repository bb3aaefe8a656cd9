/// Legal-form suffix tokens removed from entity names before comparison.
/// Matched as whole words only, so "PT MAJU JAYA" and "MAJU JAYA TBK" both
/// normalize to "MAJU JAYA" while "COOPER" keeps its embedded "CO".
const LEGAL_FORM_TOKENS: &[&str] = &[
    "PT", "CV", "TBK", "PERSERO", "UD", "PD", "FIRMA", "KOPERASI", "LTD", "LLC", "INC", "CORP",
    "CO", "PTE", "GMBH", "BV", "NV", "SA", "PLC",
];

/// Canonicalize a tax identifier: keep alphanumerics only, uppercased.
/// Never fails; empty or all-punctuation input yields the empty string.
pub fn normalize_tax_id(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Canonicalize an entity name for similarity comparison: uppercase, split
/// on punctuation/whitespace, drop legal-form tokens, rejoin single-spaced.
pub fn normalize_entity_name(name: &str) -> String {
    name.to_uppercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !LEGAL_FORM_TOKENS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}
