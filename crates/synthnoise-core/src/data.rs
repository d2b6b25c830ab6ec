//! Built-in reference data for the noise library
//!
//! Option universes for categorical substitution, non-response model
//! coefficients, name lists, and the token dictionaries behind the greedy
//! string corruptors.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::noise::scan::TokenDictionary;

// ----------------------------------------------------------------------------
// Categorical Option Universes
// ----------------------------------------------------------------------------

pub const STATES: &[&str] = &[
    "AK", "AL", "AR", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "HI", "IA", "ID", "IL",
    "IN", "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE",
    "NH", "NJ", "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VA", "VT", "WA", "WI", "WV", "WY",
];

pub const SEXES: &[&str] = &["Female", "Male"];

pub const RACE_ETHNICITIES: &[&str] = &[
    "AIAN",
    "Asian",
    "Black",
    "Latino",
    "Multiracial or Other",
    "NHOPI",
    "White",
];

pub const RELATIONS_TO_REFERENCE_PERSON: &[&str] = &[
    "Reference person",
    "Opp-sex spouse",
    "Opp-sex partner",
    "Same-sex spouse",
    "Same-sex partner",
    "Biological child",
    "Adopted child",
    "Stepchild",
    "Sibling",
    "Parent",
    "Grandchild",
    "Parent-in-law",
    "Child-in-law",
    "Other relative",
    "Roommate",
    "Foster child",
    "Other nonrelative",
    "Institutionalized GQ pop",
    "Noninstitutionalized GQ pop",
];

pub const EVENT_TYPES: &[&str] = &["creation", "death"];

pub const TAX_FORMS: &[&str] = &["W2", "1099"];

/// Options a wrong categorical value is drawn from, by column
pub fn wrong_option_universe(column: &str) -> Option<&'static [&'static str]> {
    let universe = match column {
        "state" | "employer_state" | "mailing_address_state" => STATES,
        "sex" => SEXES,
        "race_ethnicity" => RACE_ETHNICITIES,
        "relation_to_reference_person" => RELATIONS_TO_REFERENCE_PERSON,
        "event_type" => EVENT_TYPES,
        "tax_form" => TAX_FORMS,
        _ => return None,
    };
    Some(universe)
}

// ----------------------------------------------------------------------------
// Non-response Model
// ----------------------------------------------------------------------------

pub const DO_NOT_RESPOND_BASE_PROBABILITY: f64 = 0.0024;

pub const DO_NOT_RESPOND_BY_RACE: &[(&str, f64)] = &[
    ("AIAN", 0.0091),
    ("Asian", 0.0179),
    ("Black", 0.0325),
    ("Latino", 0.0456),
    ("Multiracial or Other", 0.0138),
    ("NHOPI", 0.0285),
    ("White", 0.0035),
];

/// Right-closed age bin edges shared by both sexes
pub const DO_NOT_RESPOND_AGE_BREAKS: [f64; 10] =
    [-1.0, 4.0, 9.0, 17.0, 29.0, 39.0, 49.0, 59.0, 69.0, 125.0];

pub const DO_NOT_RESPOND_FEMALE_BY_AGE: [f64; 9] = [
    0.0255, -0.0014, -0.0044, -0.0112, -0.0034, -0.0175, -0.0269, -0.0288, -0.0335,
];

pub const DO_NOT_RESPOND_MALE_BY_AGE: [f64; 9] = [
    0.0255, -0.0014, -0.0044, 0.0151, 0.0084, 0.0084, -0.0008, -0.0218, -0.0220,
];

// ----------------------------------------------------------------------------
// Names
// ----------------------------------------------------------------------------

pub const FAKE_FIRST_NAMES: &[&str] = &[
    "Alpha", "Baby", "Boy", "Child", "Daughter", "Girl", "Infant", "Mother", "Father",
    "Newborn", "No Name", "Noname", "Not Given", "Nobody", "Son", "Twin", "Unknown", "Anonymous",
];

pub const FAKE_LAST_NAMES: &[&str] = &[
    "Anonymous", "Doe", "No Name", "Noname", "Not Given", "Nobody", "Refused", "Test",
    "Unknown", "Last Name", "None",
];

const NICKNAMES: &[(&str, &[&str])] = &[
    ("Alexander", &["Alex", "Al", "Xander", "Sandy"]),
    ("Andrew", &["Andy", "Drew"]),
    ("Anthony", &["Tony"]),
    ("Barbara", &["Barb", "Barbie"]),
    ("Benjamin", &["Ben", "Benny"]),
    ("Catherine", &["Cathy", "Kate", "Katie"]),
    ("Charles", &["Charlie", "Chuck", "Chas"]),
    ("Christopher", &["Chris", "Kit"]),
    ("Daniel", &["Dan", "Danny"]),
    ("David", &["Dave", "Davy"]),
    ("Deborah", &["Deb", "Debbie"]),
    ("Edward", &["Ed", "Eddie", "Ted"]),
    ("Elizabeth", &["Liz", "Beth", "Betty", "Eliza"]),
    ("Emily", &["Em", "Emmy"]),
    ("Frances", &["Fran", "Frankie"]),
    ("Gregory", &["Greg"]),
    ("James", &["Jim", "Jimmy", "Jamie"]),
    ("Jennifer", &["Jen", "Jenny"]),
    ("John", &["Jack", "Johnny"]),
    ("Jonathan", &["Jon", "Jonny"]),
    ("Joseph", &["Joe", "Joey"]),
    ("Joshua", &["Josh"]),
    ("Katherine", &["Kate", "Kathy", "Katie"]),
    ("Kimberly", &["Kim"]),
    ("Margaret", &["Maggie", "Peggy", "Meg"]),
    ("Matthew", &["Matt"]),
    ("Michael", &["Mike", "Mikey"]),
    ("Nicholas", &["Nick", "Nicky"]),
    ("Patricia", &["Pat", "Patty", "Trish"]),
    ("Patrick", &["Pat", "Paddy"]),
    ("Rebecca", &["Becky", "Becca"]),
    ("Richard", &["Rick", "Dick", "Rich"]),
    ("Robert", &["Bob", "Rob", "Bobby"]),
    ("Samuel", &["Sam", "Sammy"]),
    ("Stephanie", &["Steph"]),
    ("Steven", &["Steve"]),
    ("Susan", &["Sue", "Susie"]),
    ("Thomas", &["Tom", "Tommy"]),
    ("Timothy", &["Tim", "Timmy"]),
    ("Victoria", &["Vicky", "Tori"]),
    ("William", &["Will", "Bill", "Billy", "Liam"]),
    ("Zachary", &["Zach"]),
];

// ----------------------------------------------------------------------------
// Token Dictionaries
// ----------------------------------------------------------------------------

/// Character shapes commonly confused by optical character recognition
const OCR_ERRORS: &[(&str, &[&str])] = &[
    ("0", &["O", "D", "Q"]),
    ("1", &["l", "I", "7"]),
    ("2", &["Z"]),
    ("5", &["S"]),
    ("6", &["G", "b"]),
    ("8", &["B"]),
    ("9", &["g", "q"]),
    ("B", &["8", "13"]),
    ("D", &["0", "O"]),
    ("E", &["F"]),
    ("G", &["6", "C"]),
    ("I", &["1", "l"]),
    ("O", &["0", "Q", "D"]),
    ("S", &["5", "8"]),
    ("Z", &["2"]),
    ("a", &["o"]),
    ("b", &["h", "6"]),
    ("c", &["e"]),
    ("e", &["c"]),
    ("g", &["9", "q"]),
    ("h", &["b", "n"]),
    ("l", &["1", "I"]),
    ("m", &["rn", "nn"]),
    ("n", &["m", "ri"]),
    ("o", &["0", "a"]),
    ("q", &["g", "9"]),
    ("w", &["vv"]),
    ("cl", &["d"]),
    ("li", &["h"]),
    ("nn", &["m"]),
    ("ri", &["n"]),
    ("rn", &["m"]),
    ("vv", &["w"]),
    ("IJ", &["U"]),
    ("iii", &["m"]),
    ("lll", &["m"]),
];

/// Spellings that sound alike
const PHONETIC_ERRORS: &[(&str, &[&str])] = &[
    ("chester", &["chestor", "chestar"]),
    ("berger", &["burger", "berg"]),
    ("stein", &["stine", "steen"]),
    ("ville", &["vil", "vill"]),
    ("augh", &["aff", "aw"]),
    ("eigh", &["ay", "ey"]),
    ("ight", &["ite", "yte"]),
    ("ough", &["off", "uff", "ow"]),
    ("tion", &["shun", "sion"]),
    ("dge", &["j", "ge"]),
    ("sch", &["sk", "sh"]),
    ("Sch", &["Sh", "Sk"]),
    ("Mac", &["Mc"]),
    ("ai", &["ay"]),
    ("ar", &["er"]),
    ("ay", &["ai", "ey"]),
    ("ch", &["tch", "sh"]),
    ("ck", &["k"]),
    ("ee", &["ea", "ie"]),
    ("ei", &["ie"]),
    ("er", &["ur", "ir"]),
    ("gh", &["g"]),
    ("ie", &["ee", "y"]),
    ("kn", &["n"]),
    ("ks", &["x"]),
    ("mb", &["m"]),
    ("Mc", &["Mac"]),
    ("oo", &["u"]),
    ("ou", &["ow"]),
    ("ow", &["ou"]),
    ("Ph", &["F"]),
    ("ph", &["f"]),
    ("qu", &["kw"]),
    ("sh", &["ch"]),
    ("th", &["t", "d"]),
    ("wr", &["r"]),
    ("C", &["K"]),
    ("K", &["C"]),
    ("c", &["k", "s"]),
    ("f", &["ph"]),
    ("j", &["g"]),
    ("k", &["c"]),
    ("s", &["z"]),
    ("x", &["ks"]),
    ("y", &["ie", "i"]),
    ("z", &["s"]),
];

/// Keys adjacent to each key on a QWERTY keyboard
const QWERTY_ERRORS: &[(&str, &[&str])] = &[
    ("1", &["2", "q"]),
    ("2", &["1", "3", "q", "w"]),
    ("3", &["2", "4", "w", "e"]),
    ("4", &["3", "5", "e", "r"]),
    ("5", &["4", "6", "r", "t"]),
    ("6", &["5", "7", "t", "y"]),
    ("7", &["6", "8", "y", "u"]),
    ("8", &["7", "9", "u", "i"]),
    ("9", &["8", "0", "i", "o"]),
    ("0", &["9", "o", "p"]),
    ("q", &["1", "2", "w", "a"]),
    ("w", &["q", "e", "2", "3", "a", "s"]),
    ("e", &["w", "r", "3", "4", "s", "d"]),
    ("r", &["e", "t", "4", "5", "d", "f"]),
    ("t", &["r", "y", "5", "6", "f", "g"]),
    ("y", &["t", "u", "6", "7", "g", "h"]),
    ("u", &["y", "i", "7", "8", "h", "j"]),
    ("i", &["u", "o", "8", "9", "j", "k"]),
    ("o", &["i", "p", "9", "0", "k", "l"]),
    ("p", &["o", "0", "l"]),
    ("a", &["q", "w", "s", "z"]),
    ("s", &["a", "d", "w", "e", "z", "x"]),
    ("d", &["s", "f", "e", "r", "x", "c"]),
    ("f", &["d", "g", "r", "t", "c", "v"]),
    ("g", &["f", "h", "t", "y", "v", "b"]),
    ("h", &["g", "j", "y", "u", "b", "n"]),
    ("j", &["h", "k", "u", "i", "n", "m"]),
    ("k", &["j", "l", "i", "o", "m"]),
    ("l", &["k", "o", "p"]),
    ("z", &["a", "s", "x"]),
    ("x", &["z", "c", "s", "d"]),
    ("c", &["x", "v", "d", "f"]),
    ("v", &["c", "b", "f", "g"]),
    ("b", &["v", "n", "g", "h"]),
    ("n", &["b", "m", "h", "j"]),
    ("m", &["n", "j", "k"]),
];

// ----------------------------------------------------------------------------
// Lookup Tables
// ----------------------------------------------------------------------------

/// Indexed reference data, built once per engine
#[derive(Debug, Clone)]
pub struct LookupTables {
    nicknames: HashMap<String, SmallVec<[String; 4]>>,
    pub ocr: TokenDictionary,
    pub phonetic: TokenDictionary,
    pub qwerty: TokenDictionary,
}

impl LookupTables {
    /// Index caller-supplied reference data
    ///
    /// Names listed with no nicknames are treated as having none.
    pub fn new<N, S>(
        nicknames: N,
        ocr: TokenDictionary,
        phonetic: TokenDictionary,
        qwerty: TokenDictionary,
    ) -> Self
    where
        N: IntoIterator<Item = (String, S)>,
        S: IntoIterator<Item = String>,
    {
        Self {
            nicknames: index_nicknames(nicknames),
            ocr,
            phonetic,
            qwerty,
        }
    }

    /// Index the built-in reference data
    pub fn builtin() -> Self {
        Self::new(
            NICKNAMES.iter().map(|(name, options)| {
                (name.to_string(), options.iter().map(|o| o.to_string()))
            }),
            TokenDictionary::from_pairs(OCR_ERRORS),
            TokenDictionary::from_pairs(PHONETIC_ERRORS),
            TokenDictionary::from_pairs(QWERTY_ERRORS),
        )
    }

    /// Replace the nickname table
    pub fn with_nicknames<N, S>(mut self, nicknames: N) -> Self
    where
        N: IntoIterator<Item = (String, S)>,
        S: IntoIterator<Item = String>,
    {
        self.nicknames = index_nicknames(nicknames);
        self
    }

    /// Replace every table the document supplies, keeping the rest
    pub fn with_reference_data(mut self, data: ReferenceData) -> Self {
        if let Some(nicknames) = data.nicknames {
            self = self.with_nicknames(nicknames);
        }
        if let Some(ocr) = data.ocr {
            self.ocr = TokenDictionary::from_entries(ocr);
        }
        if let Some(phonetic) = data.phonetic {
            self.phonetic = TokenDictionary::from_entries(phonetic);
        }
        if let Some(qwerty) = data.qwerty {
            self.qwerty = TokenDictionary::from_entries(qwerty);
        }
        self
    }

    /// Recorded nicknames of a first name
    pub fn nicknames(&self, name: &str) -> Option<&[String]> {
        self.nicknames.get(name).map(|n| n.as_slice())
    }

    pub fn has_nickname(&self, name: &str) -> bool {
        self.nicknames.contains_key(name)
    }

    /// Number of names with at least one nickname
    pub fn nickname_count(&self) -> usize {
        self.nicknames.len()
    }
}

fn index_nicknames<N, S>(nicknames: N) -> HashMap<String, SmallVec<[String; 4]>>
where
    N: IntoIterator<Item = (String, S)>,
    S: IntoIterator<Item = String>,
{
    nicknames
        .into_iter()
        .map(|(name, options)| (name, options.into_iter().collect::<SmallVec<_>>()))
        .filter(|(name, options)| !name.is_empty() && !options.is_empty())
        .collect()
}

/// Reference data document
///
/// Each table maps a name or source token to its substitutes. Tables left
/// out of the document keep the built-in data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nicknames: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qwerty: Option<BTreeMap<String, Vec<String>>>,
}

impl Default for LookupTables {
    fn default() -> Self {
        Self::builtin()
    }
}
