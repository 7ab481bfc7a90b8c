// Geographic lookup provider
//
// Synchronous country/state/city queries over an embedded dataset. Results
// are sorted by display name; unknown codes yield empty lists, never errors.
// The dataset is a curated subset; the query surface is what the rest of the
// wizard depends on.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub iso_code: &'static str,
    pub name: &'static str,
    pub phone_code: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateProvince {
    pub iso_code: &'static str,
    pub name: &'static str,
    pub country_code: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct City {
    pub name: &'static str,
    pub country_code: &'static str,
    pub state_code: &'static str,
}

const COUNTRIES: &[Country] = &[
    Country { iso_code: "AE", name: "United Arab Emirates", phone_code: "971" },
    Country { iso_code: "CA", name: "Canada", phone_code: "1" },
    Country { iso_code: "DE", name: "Germany", phone_code: "49" },
    Country { iso_code: "EG", name: "Egypt", phone_code: "20" },
    Country { iso_code: "FR", name: "France", phone_code: "33" },
    Country { iso_code: "GB", name: "United Kingdom", phone_code: "44" },
    Country { iso_code: "IN", name: "India", phone_code: "91" },
    Country { iso_code: "JO", name: "Jordan", phone_code: "962" },
    Country { iso_code: "US", name: "United States", phone_code: "1" },
];

const STATES: &[StateProvince] = &[
    StateProvince { iso_code: "AZ", name: "Abu Dhabi", country_code: "AE" },
    StateProvince { iso_code: "DU", name: "Dubai", country_code: "AE" },
    StateProvince { iso_code: "SH", name: "Sharjah", country_code: "AE" },
    StateProvince { iso_code: "BC", name: "British Columbia", country_code: "CA" },
    StateProvince { iso_code: "ON", name: "Ontario", country_code: "CA" },
    StateProvince { iso_code: "QC", name: "Quebec", country_code: "CA" },
    StateProvince { iso_code: "BE", name: "Berlin", country_code: "DE" },
    StateProvince { iso_code: "BY", name: "Bavaria", country_code: "DE" },
    StateProvince { iso_code: "ALX", name: "Alexandria", country_code: "EG" },
    StateProvince { iso_code: "C", name: "Cairo", country_code: "EG" },
    StateProvince { iso_code: "ARA", name: "Auvergne-Rhone-Alpes", country_code: "FR" },
    StateProvince { iso_code: "IDF", name: "Ile-de-France", country_code: "FR" },
    StateProvince { iso_code: "PAC", name: "Provence-Alpes-Cote d'Azur", country_code: "FR" },
    StateProvince { iso_code: "ENG", name: "England", country_code: "GB" },
    StateProvince { iso_code: "SCT", name: "Scotland", country_code: "GB" },
    StateProvince { iso_code: "DL", name: "Delhi", country_code: "IN" },
    StateProvince { iso_code: "MH", name: "Maharashtra", country_code: "IN" },
    StateProvince { iso_code: "AM", name: "Amman", country_code: "JO" },
    StateProvince { iso_code: "IR", name: "Irbid", country_code: "JO" },
    StateProvince { iso_code: "CA", name: "California", country_code: "US" },
    StateProvince { iso_code: "NY", name: "New York", country_code: "US" },
    StateProvince { iso_code: "TX", name: "Texas", country_code: "US" },
];

const CITIES: &[City] = &[
    City { name: "Abu Dhabi", country_code: "AE", state_code: "AZ" },
    City { name: "Al Ain", country_code: "AE", state_code: "AZ" },
    City { name: "Dubai", country_code: "AE", state_code: "DU" },
    City { name: "Sharjah", country_code: "AE", state_code: "SH" },
    City { name: "Vancouver", country_code: "CA", state_code: "BC" },
    City { name: "Victoria", country_code: "CA", state_code: "BC" },
    City { name: "Mississauga", country_code: "CA", state_code: "ON" },
    City { name: "Ottawa", country_code: "CA", state_code: "ON" },
    City { name: "Toronto", country_code: "CA", state_code: "ON" },
    City { name: "Montreal", country_code: "CA", state_code: "QC" },
    City { name: "Quebec City", country_code: "CA", state_code: "QC" },
    City { name: "Berlin", country_code: "DE", state_code: "BE" },
    City { name: "Munich", country_code: "DE", state_code: "BY" },
    City { name: "Nuremberg", country_code: "DE", state_code: "BY" },
    City { name: "Alexandria", country_code: "EG", state_code: "ALX" },
    City { name: "Cairo", country_code: "EG", state_code: "C" },
    City { name: "Giza", country_code: "EG", state_code: "C" },
    City { name: "Grenoble", country_code: "FR", state_code: "ARA" },
    City { name: "Lyon", country_code: "FR", state_code: "ARA" },
    City { name: "Paris", country_code: "FR", state_code: "IDF" },
    City { name: "Versailles", country_code: "FR", state_code: "IDF" },
    City { name: "Marseille", country_code: "FR", state_code: "PAC" },
    City { name: "Nice", country_code: "FR", state_code: "PAC" },
    City { name: "London", country_code: "GB", state_code: "ENG" },
    City { name: "Manchester", country_code: "GB", state_code: "ENG" },
    City { name: "Edinburgh", country_code: "GB", state_code: "SCT" },
    City { name: "Glasgow", country_code: "GB", state_code: "SCT" },
    City { name: "New Delhi", country_code: "IN", state_code: "DL" },
    City { name: "Mumbai", country_code: "IN", state_code: "MH" },
    City { name: "Pune", country_code: "IN", state_code: "MH" },
    City { name: "Amman", country_code: "JO", state_code: "AM" },
    City { name: "Irbid", country_code: "JO", state_code: "IR" },
    City { name: "Los Angeles", country_code: "US", state_code: "CA" },
    City { name: "San Diego", country_code: "US", state_code: "CA" },
    City { name: "San Francisco", country_code: "US", state_code: "CA" },
    City { name: "Buffalo", country_code: "US", state_code: "NY" },
    City { name: "New York", country_code: "US", state_code: "NY" },
    City { name: "Austin", country_code: "US", state_code: "TX" },
    City { name: "Dallas", country_code: "US", state_code: "TX" },
    City { name: "Houston", country_code: "US", state_code: "TX" },
];

pub fn all_countries() -> Vec<Country> {
    let mut out: Vec<Country> = COUNTRIES.to_vec();
    out.sort_by(|a, b| a.name.cmp(b.name));
    out
}

pub fn states_of_country(country_iso: &str) -> Vec<StateProvince> {
    if country_iso.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<StateProvince> = STATES
        .iter()
        .filter(|s| s.country_code == country_iso)
        .copied()
        .collect();
    out.sort_by(|a, b| a.name.cmp(b.name));
    out
}

pub fn cities_of_state(country_iso: &str, state_iso: &str) -> Vec<City> {
    if country_iso.is_empty() || state_iso.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<City> = CITIES
        .iter()
        .filter(|c| c.country_code == country_iso && c.state_code == state_iso)
        .copied()
        .collect();
    out.sort_by(|a, b| a.name.cmp(b.name));
    out
}

/// Find a country by display name (case-insensitive) or ISO code.
pub fn find_country_by_name(name: &str) -> Option<Country> {
    COUNTRIES
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name) || c.iso_code == name)
        .copied()
}

/// Find a state within a country by display name (case-insensitive) or ISO code.
pub fn find_state_by_name(state_name: &str, country_iso: &str) -> Option<StateProvince> {
    states_of_country(country_iso)
        .into_iter()
        .find(|s| s.name.eq_ignore_ascii_case(state_name) || s.iso_code == state_name)
}
