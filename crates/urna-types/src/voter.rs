use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{BallotBoxId, ElectionId, VoterId};
use crate::vote::{Vote, VoteStatus};

/// Discriminator holding the matriculation number, the lookup key of a voter.
pub const MATRICULATION_NUMBER: &str = "matriculationNumber";

/// Discriminator holding the voter's department.
pub const DEPARTMENT: &str = "department";

/// A person entitled to vote in one election.
///
/// The external identifier terminals use is derived from the matriculation
/// number and two checksum letters taken from the name; it is never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleVoter {
    pub id: VoterId,
    pub election: ElectionId,
    pub given_name: String,
    pub family_name: String,
    #[serde(default)]
    pub discriminators: BTreeMap<String, String>,
    #[serde(default, skip_serializing)]
    pub votes: Vec<Vote>,
}

impl EligibleVoter {
    /// A voter with no discriminators and no votes.
    pub fn new(
        id: VoterId,
        election: ElectionId,
        given_name: impl Into<String>,
        family_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            election,
            given_name: given_name.into(),
            family_name: family_name.into(),
            discriminators: BTreeMap::new(),
            votes: Vec::new(),
        }
    }

    /// Set a discriminator, e.g. [`MATRICULATION_NUMBER`].
    pub fn with_discriminator(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.discriminators.insert(name.into(), value.into());
        self
    }

    pub fn discriminator(&self, name: &str) -> Option<&str> {
        self.discriminators.get(name).map(String::as_str)
    }

    pub fn matriculation_number(&self) -> Option<&str> {
        self.discriminator(MATRICULATION_NUMBER)
    }

    pub fn department(&self) -> Option<&str> {
        self.discriminator(DEPARTMENT)
    }

    /// Two upper-case letters: the first letter of the given name and the
    /// last letter of the family name, with diacritics folded away.
    pub fn checksum(&self) -> String {
        self.given_name
            .chars()
            .next()
            .into_iter()
            .chain(self.family_name.chars().next_back())
            .map(checksum_letter)
            .collect()
    }

    /// The external identifier, e.g. `100FR` for Foo Bar with matriculation
    /// number 100. `None` when the voter has no matriculation number.
    pub fn identifier(&self) -> Option<String> {
        self.matriculation_number()
            .map(|number| format!("{number}{}", self.checksum()))
    }

    /// Whether `letters` match this voter's checksum, ignoring case. Only the
    /// expected checksum is folded; the supplied letters are compared as sent.
    pub fn checksum_matches(&self, letters: &str) -> bool {
        letters.to_uppercase() == self.checksum()
    }

    /// Queued votes cast at `ballot_box`.
    pub fn queued_votes_in(&self, ballot_box: BallotBoxId) -> impl Iterator<Item = &Vote> {
        self.votes
            .iter()
            .filter(move |v| v.ballot_box == ballot_box && v.status == VoteStatus::Queued)
    }
}

/// Fold one character to the upper-case base Latin letter used in checksums.
pub fn checksum_letter(c: char) -> char {
    match c {
        'ß' | 'ẞ' => 'S',
        'Ä' | 'ä' | 'Á' | 'á' | 'À' | 'à' | 'Â' | 'â' | 'Ã' | 'ã' | 'Å' | 'å' | 'Æ' | 'æ' => 'A',
        'Ö' | 'ö' | 'Ó' | 'ó' | 'Ò' | 'ò' | 'Ô' | 'ô' | 'Õ' | 'õ' | 'Ø' | 'ø' => 'O',
        'Ü' | 'ü' | 'Ú' | 'ú' | 'Ù' | 'ù' | 'Û' | 'û' => 'U',
        'É' | 'é' | 'È' | 'è' | 'Ê' | 'ê' | 'Ë' | 'ë' => 'E',
        'Í' | 'í' | 'Ì' | 'ì' | 'Î' | 'î' | 'Ï' | 'ï' => 'I',
        'Ç' | 'ç' => 'C',
        'Ñ' | 'ñ' => 'N',
        'Ý' | 'ý' => 'Y',
        other => other.to_uppercase().next().unwrap_or(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn voter(given: &str, family: &str, number: &str) -> EligibleVoter {
        EligibleVoter::new(VoterId::new(1), ElectionId::new(1), given, family)
            .with_discriminator(MATRICULATION_NUMBER, number)
    }

    #[test]
    fn identifier_appends_checksum_letters() {
        assert_eq!(voter("Foo", "Bar", "100").identifier().as_deref(), Some("100FR"));
    }

    #[test]
    fn checksum_folds_diacritics() {
        assert_eq!(voter("Äbc", "Bar", "1").checksum(), "AR");
        assert_eq!(voter("Øyvind", "Groß", "1").checksum(), "OS");
        assert_eq!(voter("Çelik", "Müller", "1").checksum(), "CR");
        assert_eq!(voter("Émile", "Zoé", "1").checksum(), "EE");
        assert_eq!(voter("Æsa", "Åström", "1").checksum(), "AM");
    }

    #[test]
    fn identifier_requires_matriculation_number() {
        let v = EligibleVoter::new(VoterId::new(1), ElectionId::new(1), "Foo", "Bar");
        assert!(v.identifier().is_none());
    }

    #[test]
    fn checksum_comparison_ignores_case() {
        let v = voter("Foo", "Bar", "100");
        assert!(v.checksum_matches("FR"));
        assert!(v.checksum_matches("fr"));
        assert!(!v.checksum_matches("YZ"));
        assert!(!v.checksum_matches("F"));
    }

    #[test]
    fn supplied_letters_are_not_folded() {
        let v = voter("Ärne", "Bar", "100");
        assert!(v.checksum_matches("AR"));
        assert!(v.checksum_matches("ar"));
        assert!(!v.checksum_matches("är"));
        assert!(!v.checksum_matches("ÄR"));
    }

    #[test]
    fn department_is_a_discriminator() {
        let v = voter("Foo", "Bar", "100").with_discriminator(DEPARTMENT, "physics");
        assert_eq!(v.department(), Some("physics"));
    }

    proptest! {
        #[test]
        fn identifier_is_number_plus_two_letters(
            number in "[0-9]{1,9}",
            given in "[a-zA-Z]{1,12}",
            family in "[a-zA-Z]{1,12}",
        ) {
            let v = voter(&given, &family, &number);
            let id = v.identifier().unwrap();
            prop_assert_eq!(id.len(), number.len() + 2);
            prop_assert!(id.starts_with(&number));
            prop_assert!(id[number.len()..].chars().all(|c| c.is_ascii_uppercase()));
            prop_assert!(v.checksum_matches(&id[number.len()..].to_lowercase()));
        }
    }
}
