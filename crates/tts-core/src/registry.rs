//! Tracking token registry
//!
//! A static, categorized denylist of query parameter names that carry click
//! IDs, campaign attribution or visitor identifiers. The categories exist for
//! reporting only; matching goes through the flattened [`TokenSet`].
//!
//! # Examples
//!
//! ```
//! use tts_core::registry::default_token_set;
//!
//! let tokens = default_token_set();
//! assert!(tokens.contains("fbclid"));
//! assert!(!tokens.contains("id"));
//! ```

use std::collections::HashSet;
use std::sync::OnceLock;

/// A named group of tracking parameters belonging to one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCategory {
    pub name: &'static str,
    pub tokens: &'static [&'static str],
}

// =============================================================================
// Denylist
// =============================================================================

/// Every category of tracking parameters removed by default.
///
/// Matching is case-sensitive, so `ScCid` and `SEGMENT` only match verbatim.
pub const TRACKING_TOKENS: &[TokenCategory] = &[
    TokenCategory {
        name: "facebook",
        tokens: &["fbclid", "fb_action_ids", "fb_action_types", "fb_source", "fb_ref"],
    },
    TokenCategory {
        name: "google",
        tokens: &["gclid", "gclsrc", "_ga", "_gl", "gbraid", "wbraid", "srsltid"],
    },
    TokenCategory {
        name: "utm",
        tokens: &[
            "utm_source",
            "utm_medium",
            "utm_term",
            "utm_campaign",
            "utm_content",
            "utm_cid",
            "utm_reader",
            "utm_referrer",
            "utm_name",
            "utm_social",
            "utm_social-type",
            "utm_id",
        ],
    },
    TokenCategory {
        name: "tiktok",
        tokens: &["tt_ad_id", "tt_campaign_id", "ttclid", "_ttp"],
    },
    TokenCategory {
        name: "linkedin",
        tokens: &["li_fat_id"],
    },
    TokenCategory {
        name: "pinterest",
        tokens: &["epik", "pin_ads", "pin_campaign", "_pinterest_ct", "pin_unauth"],
    },
    TokenCategory {
        name: "snapchat",
        tokens: &["ScCid", "_scid", "sc_ad_id", "sc_campaign_id"],
    },
    TokenCategory {
        name: "twitter",
        tokens: &["twclid", "t", "s"],
    },
    TokenCategory {
        name: "instagram",
        tokens: &["igshid", "ig_rid"],
    },
    TokenCategory {
        name: "hubspot",
        tokens: &["_hsenc", "_hsmi", "__hstc", "__hssc", "__hsfp"],
    },
    TokenCategory {
        name: "email",
        tokens: &[
            "mc_cid",
            "mc_eid",
            "mkt_tok",
            "_ke",
            "_klaviyo_id",
            "actid",
            "act_cid",
            "act_campaign",
            "sibsource",
            "sibeid",
            "gr_source",
            "gr_campaign_id",
            "ck_campaign",
            "ck_email_id",
            "aweber_campaign_id",
            "aweber_subscriber_id",
        ],
    },
    TokenCategory {
        name: "yandex",
        tokens: &["yclid", "_openstat"],
    },
    TokenCategory {
        name: "microsoft",
        tokens: &["wt.mc_id", "cr_cc", "msclkid"],
    },
    TokenCategory {
        name: "sendgrid",
        tokens: &["mc", "mcd", "cvosrc"],
    },
    TokenCategory {
        name: "marketing",
        tokens: &[
            "sc_channel",
            "sc_campaign",
            "sc_geo",
            "sc_publisher",
            "sc_outcome",
            "sc_country",
            "trk",
            "trkCampaign",
        ],
    },
    TokenCategory {
        name: "itm",
        tokens: &["itm_source", "itm_medium", "itm_campaign"],
    },
    // Generic names. These can collide with real parameters on unrelated sites.
    TokenCategory {
        name: "generic",
        tokens: &["__tn__", "ref", "source", "referer", "referrer"],
    },
    TokenCategory {
        name: "affiliate",
        tokens: &["afftrack", "aff_id", "aff_sub", "clickid", "zanpid"],
    },
    TokenCategory {
        name: "cdp",
        tokens: &[
            "SEGMENT",
            "spm_id",
            "spm_campaign",
            "bcid",
            "blueconic_id",
            "utag_main",
            "utag_visitor_id",
            "meiro_message_id",
        ],
    },
    TokenCategory {
        name: "advertising",
        tokens: &[
            "crt_id",
            "crt_ref",
            "adroll_fid",
            "adroll_sid",
            "rakuten_ad_id",
            "taboola_ref",
            "taboola_ad_id",
        ],
    },
    TokenCategory {
        name: "abTesting",
        tokens: &[
            "optimizely_end_user_id",
            "optimizely_visitor_id",
            "vwo_user_id",
            "vwo_test_id",
            "unbounce",
            "instapage_campaign_id",
        ],
    },
    TokenCategory {
        name: "analytics",
        tokens: &[
            "mpid",
            "mp_referrer",
            "heap_id",
            "pardot_visitor_id",
            "pardot_campaign_id",
        ],
    },
];

/// Look up a category by name.
pub fn category(name: &str) -> Option<&'static TokenCategory> {
    TRACKING_TOKENS.iter().find(|c| c.name == name)
}

/// Names of every category that lists `token`.
pub fn categories_of(token: &str) -> Vec<&'static str> {
    TRACKING_TOKENS
        .iter()
        .filter(|c| c.tokens.contains(&token))
        .map(|c| c.name)
        .collect()
}

// =============================================================================
// Token Set
// =============================================================================

/// Flattened lookup set built from one or more categories.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    tokens: HashSet<&'static str>,
}

impl TokenSet {
    /// Flatten the given categories into a single set.
    pub fn from_categories(categories: &[TokenCategory]) -> Self {
        let tokens: HashSet<&'static str> = categories
            .iter()
            .flat_map(|c| c.tokens.iter().copied())
            .collect();

        log::debug!(
            "Loaded {} tracking tokens to remove from {} categories",
            tokens.len(),
            categories.len()
        );

        Self { tokens }
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.tokens.contains(key)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tokens.iter().copied()
    }
}

impl FromIterator<&'static str> for TokenSet {
    fn from_iter<I: IntoIterator<Item = &'static str>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

static DEFAULT_TOKENS: OnceLock<TokenSet> = OnceLock::new();

/// The process-wide set built from [`TRACKING_TOKENS`].
pub fn default_token_set() -> &'static TokenSet {
    DEFAULT_TOKENS.get_or_init(|| TokenSet::from_categories(TRACKING_TOKENS))
}
