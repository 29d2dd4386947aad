// src/matching/lexicon.rs
// Fixed word tables used by company name normalization.

/// Characters replaced by a space before tokenization. `&` is handled separately.
pub const PUNCTUATION: &str = "'\"!@#$%^*()_+={}[]|\\:;<>,.?/~`-\u{2018}\u{2019}\u{201C}\u{201D}\u{2013}\u{2014}";

pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("intl", "international"),
    ("int", "international"),
    ("natl", "national"),
    ("nat", "national"),
    ("grp", "group"),
    ("tech", "technology"),
    ("techs", "technologies"),
    ("sys", "systems"),
    ("svcs", "services"),
    ("svc", "service"),
    ("sol", "solutions"),
    ("assoc", "associates"),
    ("assn", "association"),
    ("bros", "brothers"),
    ("ctr", "center"),
    ("cntl", "control"),
    ("comm", "community"),
    ("mgmt", "management"),
    ("mfg", "manufacturing"),
    ("eng", "engineering"),
    ("equip", "equipment"),
    ("elec", "electronic"),
    ("envir", "environmental"),
    ("dev", "development"),
    ("dist", "distributing"),
    ("distr", "distribution"),
    ("ent", "enterprises"),
    ("govt", "government"),
    ("hosp", "hospital"),
    ("inst", "institute"),
    ("labs", "laboratories"),
    ("maint", "maintenance"),
    ("mtc", "maintenance"),
    ("med", "medical"),
    ("petro", "petroleum"),
    ("prod", "products"),
    ("pub", "publishing"),
    ("transp", "transportation"),
    ("univ", "university"),
    ("util", "utility"),
    ("utils", "utilities"),
    ("hldgs", "holdings"),
    ("invt", "investment"),
];

pub const COUNTRIES: &[(&str, &str)] = &[
    ("us", "united states"),
    ("usa", "united states"),
    ("uk", "united kingdom"),
    ("gb", "great britain"),
    ("uae", "united arab emirates"),
];

/// Legal entity designators removed anywhere in a name as whole words.
pub const LEGAL_FORMS: &[&str] = &[
    "limited", "ltd", "inc", "incorporated", "llc", "llp", "corp", "corporation", "co", "company",
    "gmbh", "ag", "sa", "nv", "bv", "plc", "lp", "pllc", "pty", "pvt",
];

/// Designators also written with a dot after each letter ("l.l.c.", "c.o.").
pub const DOTTED_LEGAL_FORMS: &[&str] = &["llc", "llp", "plc", "pty", "pvt", "inc", "ltd", "co", "corp"];

/// Generic industry and marketing words. Stripped from the end of a normalized
/// name and dropped everywhere from the core name.
pub const COMMON_WORDS: &[&str] = &[
    "group", "holdings", "international", "global", "world", "worldwide", "solutions", "services",
    "technologies", "systems", "industries", "products", "enterprises", "ventures", "partners",
    "consulting", "investment", "investments", "management", "financial", "capital", "bank",
    "trust", "trading", "media", "communications", "technology", "tech", "software", "networks",
    "network", "pharmaceuticals", "pharma", "healthcare", "medical", "research", "development",
    "energy", "resources", "property", "properties", "real estate", "construction", "associates",
    "laboratories", "manufacturing", "engineering",
];

/// Standard English stopwords.
pub const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];
