//! Built-in pattern sets and text normalisation.
//!
//! Every pattern is matched against [`normalize`]d text: lowercase ASCII with
//! diacritics folded, punctuation replaced by spaces and whitespace collapsed.
//! Patterns must therefore be written without punctuation or accents.

/// Phrases (Dutch and English) signalling the customer wants a person.
pub const HUMAN_REQUEST_PATTERNS: &[&str] = &[
    r"\b(mens|medewerker|persoon|collega|iemand)\b.*\b(spreken|praten)\b",
    r"\b(spreken|praten|contact) met (een |de )?(echte )?(mens|medewerker|persoon|collega|iemand)\b",
    r"\b(echte|menselijke) (mens|medewerker|persoon|hulp|ondersteuning)\b",
    // No "medewerker": "ik wil een medewerker toevoegen" asks about user seats.
    r"\b(ik wil|i want|i need|graag)( een| a| an)? (mens|human|person)\b",
    r"\b(bel|bellen) (me|mij)\b",
    r"\b(me|mij) (bellen|terugbellen|opbellen)\b",
    r"\b(geen|niet met een) (bot|robot|computer)\b",
    r"\b(talk|speak|chat) (to|with) (a |an |your |the )?(\w+ )?(human|person|agent|someone|somebody|representative|staff)\b",
    r"\b(real|live) (person|human|agent)\b",
    r"\bnot (a |with a )?(bot|robot|machine)\b",
    r"\b(call|phone) me\b",
];

/// Categories of content the agent must never send, with their patterns.
pub const BLOCKED_CONTENT_PATTERNS: &[(&str, &str)] = &[
    ("refund", r"\b(refund|refunded|refunds|terugbetal\w*|geld terug|restitutie|creditnota)\b"),
    (
        "account_deletion",
        r"\b(delete|deleted|deleting|verwijder\w*|opheffen|opzeggen)\b.*\b(account|profiel|administratie|abonnement)\b",
    ),
    (
        "account_deletion",
        r"\b(account|profiel|administratie|abonnement)\b.*\b(deleted|removed|verwijderd|opgeheven|opgezegd)\b",
    ),
    (
        "credential_disclosure",
        r"\b(your|je|jouw|uw)( \w+)? (password|wachtwoord|api key|api sleutel|access token|token|secret)( \w+)? (is|luidt)\b",
    ),
    ("credential_disclosure", r"\b(sk|pk|rk)_(live|test)_\w{6,}"),
    ("credential_disclosure", r"\bbearer \w{16,}"),
    (
        "payment_data",
        r"\b(credit card|creditcard|card number|kaartnummer|cvc|cvv|iban nummer|rekeningnummer)\b",
    ),
    ("unconditional_promise", r"\b(i|we|wij|ik) (guarantee|promise|garandeer|garanderen|beloof|beloven)\b"),
    (
        "unconditional_promise",
        r"\b(will be|wordt|komt)\b.*\b(released|available|fixed|beschikbaar|opgelost|live)\b.*\b(tomorrow|morgen|next week|next month|volgende week|volgende maand|within \d+ days|binnen \d+ dagen)\b",
    ),
];

/// Phrases marking a drafted answer as uncertain.
pub const DEFAULT_HEDGE_PHRASES: &[&str] = &[
    "i m not sure",
    "i am not sure",
    "not certain",
    "i don t know",
    "i do not know",
    "i think",
    "maybe",
    "perhaps",
    "possibly",
    "might be",
    "ik weet het niet",
    "ik weet niet",
    "niet zeker",
    "ik denk",
    "misschien",
    "wellicht",
];

pub const DEFAULT_DEFLECTION_MESSAGE: &str = "Bedankt voor je bericht. Deze vraag kan ik niet zelf \
afhandelen, daarom heb ik hem doorgezet naar een collega. Je hoort zo snel mogelijk van ons.";

pub const DEFAULT_FORWARDED_MESSAGE: &str = "Ik heb je vraag doorgezet naar een medewerker. \
Je hoort zo snel mogelijk van ons.";

/// Normalise text for fuzzy matching.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let c = fold_diacritic(c);
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'ç' => 'c',
        'ñ' => 'n',
        _ => c,
    }
}

/// Whether `phrase` occurs in `normalized` on word boundaries.
pub fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    let phrase = normalize(phrase);
    if phrase.is_empty() {
        return false;
    }
    format!(" {normalized} ").contains(&format!(" {phrase} "))
}
