//! Password strength rules.
//!
//! Characters are classified by Unicode general category, so `Ä`, `ß`, `٣`
//! and `€` count as uppercase, lowercase, digit and symbol respectively.

use unicode_general_category::{get_general_category, GeneralCategory};

pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    /// At least this many characters (Unicode scalar values).
    MinLength(usize),
    Uppercase,
    Lowercase,
    Digit,
    /// Punctuation (P*) or symbol (S*).
    Symbol,
}

impl PasswordRule {
    fn is_satisfied(&self, password: &str) -> bool {
        match self {
            PasswordRule::MinLength(n) => password.chars().count() >= *n,
            PasswordRule::Uppercase => password.chars().any(|c| class_of(c) == CharClass::Upper),
            PasswordRule::Lowercase => password.chars().any(|c| class_of(c) == CharClass::Lower),
            PasswordRule::Digit => password.chars().any(|c| class_of(c) == CharClass::Digit),
            PasswordRule::Symbol => password.chars().any(|c| class_of(c) == CharClass::Symbol),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PasswordRule::MinLength(n) => format!("at least {n} characters"),
            PasswordRule::Uppercase => "an uppercase letter".into(),
            PasswordRule::Lowercase => "a lowercase letter".into(),
            PasswordRule::Digit => "a digit".into(),
            PasswordRule::Symbol => "a punctuation or symbol character".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Upper,
    Lower,
    Digit,
    Symbol,
    Other,
}

fn class_of(c: char) -> CharClass {
    use GeneralCategory::*;
    match get_general_category(c) {
        UppercaseLetter => CharClass::Upper,
        LowercaseLetter => CharClass::Lower,
        DecimalNumber | LetterNumber | OtherNumber => CharClass::Digit,
        ConnectorPunctuation | DashPunctuation | OpenPunctuation | ClosePunctuation
        | InitialPunctuation | FinalPunctuation | OtherPunctuation | MathSymbol
        | CurrencySymbol | ModifierSymbol | OtherSymbol => CharClass::Symbol,
        _ => CharClass::Other,
    }
}

/// A set of rules that must all hold. Pure, no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    rules: Vec<PasswordRule>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new(vec![
            PasswordRule::MinLength(MIN_PASSWORD_CHARS),
            PasswordRule::Uppercase,
            PasswordRule::Lowercase,
            PasswordRule::Digit,
            PasswordRule::Symbol,
        ])
    }
}

impl PasswordPolicy {
    pub fn new(rules: Vec<PasswordRule>) -> Self {
        Self { rules }
    }

    pub fn with_rule(mut self, rule: PasswordRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[PasswordRule] {
        &self.rules
    }

    pub fn is_acceptable(&self, password: &str) -> bool {
        !password.is_empty() && self.rules.iter().all(|r| r.is_satisfied(password))
    }

    /// Rules the password fails, in policy order. An empty password fails all of them.
    pub fn violations(&self, password: &str) -> Vec<PasswordRule> {
        if password.is_empty() {
            return self.rules.clone();
        }
        self.rules.iter().copied().filter(|r| !r.is_satisfied(password)).collect()
    }
}
