//! Static table of international calling codes
//!
//! Codes shared by several territories carry a default ISO code plus a list of
//! alternates that a URL hint can select.

/// One calling code and the territory it resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallingCode {
    /// Digits without the leading `+`
    pub code: &'static str,
    /// Lowercase ISO 3166-1 alpha-2 code of the default territory
    pub iso: &'static str,
    /// Other territories sharing the code: (iso, URL keywords)
    pub alternates: &'static [(&'static str, &'static [&'static str])],
}

const fn cc(code: &'static str, iso: &'static str) -> CallingCode {
    CallingCode {
        code,
        iso,
        alternates: &[],
    }
}

const fn shared(
    code: &'static str,
    iso: &'static str,
    alternates: &'static [(&'static str, &'static [&'static str])],
) -> CallingCode {
    CallingCode {
        code,
        iso,
        alternates,
    }
}

pub static CALLING_CODES: &[CallingCode] = &[
    // North American Numbering Plan
    shared(
        "1",
        "us",
        &[("ca", &["canada", "ca"]), ("pr", &["puerto-rico", "pr"])],
    ),
    cc("1242", "bs"),
    cc("1246", "bb"),
    cc("1264", "ai"),
    cc("1268", "ag"),
    cc("1284", "vg"),
    cc("1340", "vi"),
    cc("1345", "ky"),
    cc("1441", "bm"),
    cc("1473", "gd"),
    cc("1649", "tc"),
    cc("1664", "ms"),
    cc("1670", "mp"),
    cc("1671", "gu"),
    cc("1684", "as"),
    cc("1721", "sx"),
    cc("1758", "lc"),
    cc("1767", "dm"),
    cc("1784", "vc"),
    cc("1787", "pr"),
    cc("1809", "do"),
    cc("1829", "do"),
    cc("1849", "do"),
    cc("1868", "tt"),
    cc("1869", "kn"),
    cc("1876", "jm"),
    cc("1939", "pr"),
    // Zone 2
    cc("20", "eg"),
    cc("211", "ss"),
    shared("212", "ma", &[("eh", &["western-sahara"])]),
    cc("213", "dz"),
    cc("216", "tn"),
    cc("218", "ly"),
    cc("220", "gm"),
    cc("221", "sn"),
    cc("222", "mr"),
    cc("223", "ml"),
    cc("224", "gn"),
    cc("225", "ci"),
    cc("226", "bf"),
    cc("227", "ne"),
    cc("228", "tg"),
    cc("229", "bj"),
    cc("230", "mu"),
    cc("231", "lr"),
    cc("232", "sl"),
    cc("233", "gh"),
    cc("234", "ng"),
    cc("235", "td"),
    cc("236", "cf"),
    cc("237", "cm"),
    cc("238", "cv"),
    cc("239", "st"),
    cc("240", "gq"),
    cc("241", "ga"),
    cc("242", "cg"),
    cc("243", "cd"),
    cc("244", "ao"),
    cc("245", "gw"),
    cc("246", "io"),
    cc("248", "sc"),
    cc("249", "sd"),
    cc("250", "rw"),
    cc("251", "et"),
    cc("252", "so"),
    cc("253", "dj"),
    cc("254", "ke"),
    cc("255", "tz"),
    cc("256", "ug"),
    cc("257", "bi"),
    cc("258", "mz"),
    cc("260", "zm"),
    cc("261", "mg"),
    shared("262", "re", &[("yt", &["mayotte"])]),
    cc("263", "zw"),
    cc("264", "na"),
    cc("265", "mw"),
    cc("266", "ls"),
    cc("267", "bw"),
    cc("268", "sz"),
    cc("269", "km"),
    cc("27", "za"),
    cc("290", "sh"),
    cc("291", "er"),
    cc("297", "aw"),
    cc("298", "fo"),
    cc("299", "gl"),
    // Zones 3 and 4: Europe
    cc("30", "gr"),
    cc("31", "nl"),
    cc("32", "be"),
    cc("33", "fr"),
    cc("34", "es"),
    cc("350", "gi"),
    cc("351", "pt"),
    cc("352", "lu"),
    cc("353", "ie"),
    cc("354", "is"),
    cc("355", "al"),
    cc("356", "mt"),
    cc("357", "cy"),
    shared("358", "fi", &[("ax", &["aland"])]),
    cc("359", "bg"),
    cc("36", "hu"),
    cc("370", "lt"),
    cc("371", "lv"),
    cc("372", "ee"),
    cc("373", "md"),
    cc("374", "am"),
    cc("375", "by"),
    cc("376", "ad"),
    cc("377", "mc"),
    cc("378", "sm"),
    cc("380", "ua"),
    cc("381", "rs"),
    cc("382", "me"),
    cc("383", "xk"),
    cc("385", "hr"),
    cc("386", "si"),
    cc("387", "ba"),
    cc("389", "mk"),
    shared("39", "it", &[("va", &["vatican"])]),
    cc("40", "ro"),
    cc("41", "ch"),
    cc("420", "cz"),
    cc("421", "sk"),
    cc("423", "li"),
    cc("43", "at"),
    shared(
        "44",
        "gb",
        &[("gg", &["guernsey"]), ("je", &["jersey"]), ("im", &["isle-of-man"])],
    ),
    cc("45", "dk"),
    cc("46", "se"),
    shared("47", "no", &[("sj", &["svalbard"])]),
    cc("48", "pl"),
    cc("49", "de"),
    // Zone 5: South and Central America
    cc("500", "fk"),
    cc("501", "bz"),
    cc("502", "gt"),
    cc("503", "sv"),
    cc("504", "hn"),
    cc("505", "ni"),
    cc("506", "cr"),
    cc("507", "pa"),
    cc("508", "pm"),
    cc("509", "ht"),
    cc("51", "pe"),
    cc("52", "mx"),
    cc("53", "cu"),
    cc("54", "ar"),
    cc("55", "br"),
    cc("56", "cl"),
    cc("57", "co"),
    cc("58", "ve"),
    shared("590", "gp", &[("bl", &["saint-barthelemy"]), ("mf", &["saint-martin"])]),
    cc("591", "bo"),
    cc("592", "gy"),
    cc("593", "ec"),
    cc("594", "gf"),
    cc("595", "py"),
    cc("596", "mq"),
    cc("597", "sr"),
    cc("598", "uy"),
    shared("599", "cw", &[("bq", &["bonaire"])]),
    // Zone 6: Oceania and South-East Asia
    cc("60", "my"),
    shared("61", "au", &[("cx", &["christmas-island"]), ("cc", &["cocos"])]),
    cc("62", "id"),
    cc("63", "ph"),
    cc("64", "nz"),
    cc("65", "sg"),
    cc("66", "th"),
    cc("670", "tl"),
    cc("672", "nf"),
    cc("673", "bn"),
    cc("674", "nr"),
    cc("675", "pg"),
    cc("676", "to"),
    cc("677", "sb"),
    cc("678", "vu"),
    cc("679", "fj"),
    cc("680", "pw"),
    cc("681", "wf"),
    cc("682", "ck"),
    cc("683", "nu"),
    cc("685", "ws"),
    cc("686", "ki"),
    cc("687", "nc"),
    cc("688", "tv"),
    cc("689", "pf"),
    cc("690", "tk"),
    cc("691", "fm"),
    cc("692", "mh"),
    // Zone 7
    shared("7", "ru", &[("kz", &["kazakhstan", "kz"])]),
    // Zone 8: East Asia
    cc("81", "jp"),
    cc("82", "kr"),
    cc("84", "vn"),
    cc("850", "kp"),
    cc("852", "hk"),
    cc("853", "mo"),
    cc("855", "kh"),
    cc("856", "la"),
    cc("86", "cn"),
    cc("880", "bd"),
    cc("886", "tw"),
    // Zone 9: West, Central and South Asia
    cc("90", "tr"),
    cc("91", "in"),
    cc("92", "pk"),
    cc("93", "af"),
    cc("94", "lk"),
    cc("95", "mm"),
    cc("960", "mv"),
    cc("961", "lb"),
    cc("962", "jo"),
    cc("963", "sy"),
    cc("964", "iq"),
    cc("965", "kw"),
    cc("966", "sa"),
    cc("967", "ye"),
    cc("968", "om"),
    cc("970", "ps"),
    cc("971", "ae"),
    cc("972", "il"),
    cc("973", "bh"),
    cc("974", "qa"),
    cc("975", "bt"),
    cc("976", "mn"),
    cc("977", "np"),
    cc("98", "ir"),
    cc("992", "tj"),
    cc("993", "tm"),
    cc("994", "az"),
    cc("995", "ge"),
    cc("996", "kg"),
    cc("998", "uz"),
];
