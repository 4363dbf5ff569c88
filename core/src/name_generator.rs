//! Deterministic customer names and street addresses from curated word lists.
//!
//! All generation is deterministic (same RNG seed = same names).

use crate::{config::RegionPool, rng::StageRng};

/// Deterministic name and address generator
pub struct NameGenerator;

impl NameGenerator {
    /// Generate a full name (first + last) deterministically
    pub fn generate_full_name(rng: &mut StageRng) -> String {
        let first_name = Self::pick(rng, Self::first_names());
        let last_name = Self::pick(rng, Self::last_names());
        format!("{first_name} {last_name}")
    }

    /// Single-line mailing address: "<number> <street>, <city>, <state> <zip>".
    pub fn generate_address(rng: &mut StageRng, region: &RegionPool) -> String {
        let number = rng.between_inclusive(1, 9999);
        let street = Self::pick(rng, Self::street_names());
        let suffix = Self::pick(rng, Self::street_suffixes());
        let zip_tail = rng.next_u64_below(100);
        format!(
            "{number} {street} {suffix}, {}, {} {}{zip_tail:02}",
            region.city, region.state, region.zip_prefix
        )
    }

    fn pick(rng: &mut StageRng, words: &'static [&'static str]) -> &'static str {
        words[rng.next_u64_below(words.len() as u64) as usize]
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "James", "Mary", "Robert", "Patricia", "Michael", "Jennifer", "David", "Linda",
            "William", "Elizabeth", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
            "Daniel", "Karen", "Matthew", "Nancy", "Anthony", "Lisa", "Mark", "Betty",
            "Steven", "Sandra", "Andrew", "Ashley", "Joshua", "Emily", "Kevin", "Michelle",
            "Brian", "Amanda", "George", "Melissa", "Timothy", "Rebecca", "Jason", "Laura",
            "Ryan", "Stephanie", "Jacob", "Nicole", "Nicholas", "Rachel", "Eric", "Maria",
            "Jonathan", "Heather", "Justin", "Olivia", "Samuel", "Victoria", "Gregory", "Megan",
            "Patrick", "Hannah", "Nathan", "Abigail", "Zachary", "Sophia", "Noah", "Grace",
            "Ethan", "Isabella", "Dylan", "Charlotte", "Logan", "Ava", "Mason", "Mia",
            "Aaliyah", "Mateo", "Priya", "Wei", "Oluwaseun", "Siobhan", "Renée", "José",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
            "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson",
            "Taylor", "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White",
            "Harris", "Sanchez", "Clark", "Ramirez", "Lewis", "Robinson", "Walker", "Young",
            "Allen", "King", "Wright", "Scott", "Torres", "Nguyen", "Hill", "Flores",
            "Green", "Adams", "Nelson", "Baker", "Hall", "Rivera", "Campbell", "Mitchell",
            "Carter", "Roberts", "Patel", "Kim", "Chen", "O'Brien", "McDonald", "Van Dyke",
            "St. James", "Okafor", "Kowalski", "Nakamura", "Fitzgerald", "Ortiz", "Murphy",
        ]
    }

    fn street_names() -> &'static [&'static str] {
        &[
            "Maple", "Oak", "Pine", "Cedar", "Elm", "Washington", "Lake", "Hill",
            "Park", "Main", "Sunset", "Highland", "River", "Church", "Spring", "Ridge",
            "Meadow", "Willow", "Lincoln", "Franklin", "Jefferson", "Madison", "Chestnut",
            "Walnut", "Forest", "Valley", "Harbor", "Mill", "Broad", "Center",
        ]
    }

    fn street_suffixes() -> &'static [&'static str] {
        &["St", "Ave", "Blvd", "Rd", "Ln", "Dr", "Ct", "Way", "Pl", "Ter"]
    }
}
