/// Built-in contract templates offered by the client, in display order.
pub const TEMPLATES: [&str; 12] = [
    "ERC20 Token",
    "NFT Minting",
    "Voting System",
    "Decentralized Exchange",
    "DAO Governance",
    "Subscription Service",
    "Supply Chain Management",
    "Crowdfunding Platform",
    "Multi-Sig Wallet",
    "Escrow Service",
    "Decentralized Storage",
    "Lending Protocol",
];

/// All built-in templates.
pub fn all() -> &'static [&'static str] {
    &TEMPLATES
}

/// Find a built-in template by name, ignoring case and surrounding whitespace.
pub fn find(name: &str) -> Option<&'static str> {
    let needle = name.trim();
    TEMPLATES
        .iter()
        .copied()
        .find(|template| template.eq_ignore_ascii_case(needle))
}

/// Resolve a user selector into a template name.
///
/// Accepts a 1-based catalogue index (`"1"` is "ERC20 Token") or a name. Names
/// found in the catalogue are normalized to their canonical spelling; any other
/// non-blank name is passed through as-is, since the gateway accepts free-form
/// template names. Returns `None` for blank selectors and out-of-range indexes.
pub fn resolve(selector: &str) -> Option<String> {
    let selector = selector.trim();
    if selector.is_empty() {
        return None;
    }

    if let Ok(index) = selector.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| TEMPLATES.get(i))
            .map(|t| t.to_string());
    }

    Some(
        find(selector)
            .map(str::to_string)
            .unwrap_or_else(|| selector.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_keeps_display_order() {
        let templates = all();
        assert_eq!(templates.len(), 12);
        assert_eq!(templates[0], "ERC20 Token");
        assert_eq!(templates[11], "Lending Protocol");
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(find("erc20 token"), Some("ERC20 Token"));
        assert_eq!(find("  DAO GOVERNANCE "), Some("DAO Governance"));
        assert_eq!(find("Flash Loans"), None);
    }

    #[test]
    fn test_resolve_by_index() {
        assert_eq!(resolve("1").as_deref(), Some("ERC20 Token"));
        assert_eq!(resolve("12").as_deref(), Some("Lending Protocol"));
        assert_eq!(resolve("0"), None);
        assert_eq!(resolve("13"), None);
    }

    #[test]
    fn test_resolve_by_name() {
        assert_eq!(resolve("multi-sig wallet").as_deref(), Some("Multi-Sig Wallet"));
    }

    #[test]
    fn test_resolve_passes_unknown_names_through() {
        assert_eq!(resolve("Flash Loan Pool").as_deref(), Some("Flash Loan Pool"));
    }

    #[test]
    fn test_resolve_blank() {
        assert_eq!(resolve(""), None);
        assert_eq!(resolve("   "), None);
    }
}
