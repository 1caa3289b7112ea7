//! Dictionary-based spell correction for free-text fields.
//!
//! Each whitespace token is looked up in a small per-field dictionary. An
//! exact key hit always applies. Otherwise the nearest key by edit distance
//! is used, but only inside the field's distance budget, which is further
//! capped for short tokens so that novel values (surnames, unusual insurer
//! names) are left alone.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellField {
    Name,
    Location,
    Symptoms,
    Procedure,
    Insurance,
}

impl SpellField {
    /// Largest edit distance at which a correction is applied.
    pub fn max_distance(&self) -> usize {
        match self {
            SpellField::Name => 2,
            _ => 1,
        }
    }

    fn dictionary(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            SpellField::Name => NAME_WORDS,
            SpellField::Location => LOCATION_WORDS,
            SpellField::Symptoms => SYMPTOM_WORDS,
            SpellField::Procedure => PROCEDURE_WORDS,
            SpellField::Insurance => INSURANCE_WORDS,
        }
    }
}

const NAME_WORDS: &[(&str, &str)] = &[
    ("jon", "John"),
    ("john", "John"),
    ("jogn", "John"),
    ("jpgn", "John"),
    ("jhon", "John"),
    ("jahn", "John"),
    ("jane", "Jane"),
    ("jene", "Jane"),
    ("jain", "Jane"),
    ("mike", "Mike"),
    ("myke", "Mike"),
    ("sarah", "Sarah"),
    ("sara", "Sarah"),
    ("david", "David"),
    ("davd", "David"),
    ("emily", "Emily"),
    ("emili", "Emily"),
    ("emly", "Emily"),
    ("robert", "Robert"),
    ("lisa", "Lisa"),
    ("michael", "Michael"),
    ("michal", "Michael"),
    ("jennifer", "Jennifer"),
    ("william", "William"),
    ("elizabeth", "Elizabeth"),
];

const LOCATION_WORDS: &[(&str, &str)] = &[
    ("downtown", "Downtown"),
    ("medical", "Medical"),
    ("center", "Center"),
    ("office", "Office"),
    ("clinic", "Clinic"),
    ("hospital", "Hospital"),
    ("building", "Building"),
    ("floor", "Floor"),
    ("street", "Street"),
    ("avenue", "Avenue"),
    ("road", "Road"),
];

const SYMPTOM_WORDS: &[(&str, &str)] = &[
    ("pain", "pain"),
    ("headache", "headache"),
    ("nausea", "nausea"),
    ("dizziness", "dizziness"),
    ("fatigue", "fatigue"),
    ("swelling", "swelling"),
    ("stiffness", "stiffness"),
    ("back", "back"),
    ("neck", "neck"),
    ("shoulder", "shoulder"),
    ("knee", "knee"),
    ("chest", "chest"),
    ("abdominal", "abdominal"),
    ("joint", "joint"),
];

const PROCEDURE_WORDS: &[(&str, &str)] = &[
    ("therapy", "therapy"),
    ("consultation", "consultation"),
    ("examination", "examination"),
    ("scan", "scan"),
    ("test", "test"),
    ("treatment", "treatment"),
    ("surgery", "surgery"),
    ("physical", "physical"),
    ("occupational", "occupational"),
    ("speech", "speech"),
];

const INSURANCE_WORDS: &[(&str, &str)] = &[
    ("blue", "Blue"),
    ("cross", "Cross"),
    ("shield", "Shield"),
    ("aetna", "Aetna"),
    ("cigna", "Cigna"),
    ("united", "United"),
    ("health", "Health"),
    ("care", "Care"),
    ("medicare", "Medicare"),
    ("medicaid", "Medicaid"),
];

/// Classic dynamic-programming edit distance over chars, two rows.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Short tokens get a tighter budget: a three-letter surname is two edits
/// away from half the dictionary.
fn budget(field: SpellField, token_len: usize) -> usize {
    if token_len < 4 {
        return 0;
    }
    field.max_distance().min((token_len / 3).max(1))
}

fn exact_word(word: &str, field: SpellField) -> Option<&'static str> {
    let lower = word.to_lowercase();
    field
        .dictionary()
        .iter()
        .find(|(key, _)| *key == lower)
        .map(|(_, fixed)| *fixed)
}

/// Corrects one token, or returns `None` when nothing is close enough.
pub fn correct_word(word: &str, field: SpellField) -> Option<&'static str> {
    if let Some(fixed) = exact_word(word, field) {
        return Some(fixed);
    }

    let lower = word.to_lowercase();
    let dictionary = field.dictionary();
    let limit = budget(field, lower.chars().count());
    if limit == 0 {
        return None;
    }
    dictionary
        .iter()
        .map(|(key, fixed)| (levenshtein(&lower, key), *fixed))
        .filter(|(distance, _)| *distance <= limit)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, fixed)| fixed)
}

/// Corrects every token of `input`, capitalizing every name part.
pub fn correct(input: &str, field: SpellField) -> String {
    input
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            // the name dictionary holds given names; later parts only take
            // exact hits so surnames are never fuzzed into a given name
            let fixed = if field == SpellField::Name && i > 0 {
                exact_word(word, field)
            } else {
                correct_word(word, field)
            };
            match (fixed, field) {
                (Some(fixed), _) => fixed.to_string(),
                (None, SpellField::Name) => capitalize_name_part(word),
                (None, _) => word.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `o'brien` → `O'brien`, `smith-jones` → `Smith-jones`.
pub fn capitalize_name_part(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}
