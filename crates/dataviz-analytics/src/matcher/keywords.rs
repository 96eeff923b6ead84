//! Bilingual (French/English) keyword sets for the question cascade.

pub const GREETING: &[&str] = &[
    "salut",
    "hello",
    "hi",
    "bonjour",
    "bonsoir",
    "ça va",
    "how are you",
    "quoi de neuf",
];

pub const THANKS: &[&str] = &["merci", "thank you", "thanks", "gracias"];

pub const TREND: &[&str] = &[
    "prédict",
    "prediction",
    "predir",
    "predit",
    "predict",
    "forecast",
    "futur",
    "future",
    "tendance",
    "trend",
    "extrapoler",
];

pub const ROW: &[&str] = &["ligne", "row", "enregistrement", "observation", "record"];

pub const ROW_QUANTITY: &[&str] = &["combien", "nombre", "how", "total", "quoi"];

pub const COLUMN: &[&str] = &["colonne", "column", "variable", "feature", "champ"];

pub const COLUMN_QUANTITY: &[&str] = &["combien", "nombre", "how", "quoi"];

pub const MISSING: &[&str] = &["manquant", "missing", "null", "nan", "vide", "empty"];

pub const DUPLICATES: &[&str] = &[
    "doublon",
    "duplicate",
    "doublons",
    "duplique",
    "répété",
    "unique",
    "identique",
];

pub const MEAN: &[&str] = &[
    "moyenne", "mean", "moyen", "average", "avg", "moyene", "moyennes", "moy",
];

pub const MIN: &[&str] = &["minimum", "min"];

pub const MAX: &[&str] = &["max", "maximum"];

pub const STD: &[&str] = &[
    "écart",
    "std",
    "standard",
    "deviation",
    "variabilite",
    "variation",
    "dispersion",
    "ecart",
];

pub const MEDIAN: &[&str] = &["médiane", "median", "mediane", "centre"];

pub const SUMMARY: &[&str] = &[
    "résumé", "resume", "summary", "apercu", "overview", "total", "recap",
];

pub const CLEANING: &[&str] = &[
    "nettoyer", "clean", "probleme", "problème", "issue", "nettoie",
];

pub const VISUALIZATION: &[&str] = &[
    "visuali",
    "graphique",
    "plot",
    "chart",
    "graph",
    "image",
    "affiche",
];
