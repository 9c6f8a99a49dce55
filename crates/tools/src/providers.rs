//! Local English-class provider catalog
//!
//! Read-only reference data for the Norwich and Great Yarmouth areas,
//! filtered by the provider-lookup tool. Never mutated by the core.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Area a provider operates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Norwich,
    Yarmouth,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Norwich => "norwich",
            Region::Yarmouth => "yarmouth",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Filter accepted by the lookup tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionFilter {
    Norwich,
    Yarmouth,
    All,
}

impl RegionFilter {
    /// Parse the tool's enum-constrained `region` argument.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "norwich" => Some(RegionFilter::Norwich),
            "yarmouth" => Some(RegionFilter::Yarmouth),
            "all" => Some(RegionFilter::All),
            _ => None,
        }
    }

    fn matches(&self, region: Region) -> bool {
        match self {
            RegionFilter::All => true,
            RegionFilter::Norwich => region == Region::Norwich,
            RegionFilter::Yarmouth => region == Region::Yarmouth,
        }
    }
}

/// A local English-class provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provider {
    pub region: Region,
    pub name: &'static str,
    pub short_description: &'static str,
    pub contact_email: Option<&'static str>,
    pub contact_phone: Option<&'static str>,
    pub website: &'static str,
    pub is_free: bool,
    pub is_accredited: bool,
    pub is_drop_in: bool,
    pub is_online: bool,
    pub schedule: &'static str,
}

impl Provider {
    /// The contact method the summary leads with: email, then phone, then
    /// the website.
    pub fn best_contact(&self) -> &'static str {
        self.contact_email
            .or(self.contact_phone)
            .unwrap_or("see website")
    }

    /// One line of the human-readable summary the tool returns.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "- {} ({}): {}. Contact: {}.",
            self.name,
            self.region,
            self.short_description,
            self.best_contact()
        );
        if self.is_free {
            line.push_str(" FREE.");
        }
        if self.is_accredited {
            line.push_str(" Accredited.");
        }
        if self.is_drop_in {
            line.push_str(" Drop-in welcome.");
        }
        line
    }
}

/// The provider catalog
pub static PROVIDERS: Lazy<Vec<Provider>> = Lazy::new(|| {
    vec![
        Provider {
            region: Region::Norwich,
            name: "Norwich City College ESOL",
            short_description: "Accredited ESOL courses from entry level to Level 2",
            contact_email: Some("esol@ccn.ac.uk"),
            contact_phone: Some("01603 773311"),
            website: "https://www.ccn.ac.uk/esol",
            is_free: false,
            is_accredited: true,
            is_drop_in: false,
            is_online: false,
            schedule: "Weekdays, daytime and evening classes",
        },
        Provider {
            region: Region::Norwich,
            name: "English+ Conversation Café",
            short_description: "Relaxed weekly conversation practice over tea and coffee",
            contact_email: Some("hello@englishplusnorwich.org"),
            contact_phone: None,
            website: "https://englishplusnorwich.org",
            is_free: true,
            is_accredited: false,
            is_drop_in: true,
            is_online: false,
            schedule: "Thursdays 10:00-12:00, Norwich Millennium Library",
        },
        Provider {
            region: Region::Norwich,
            name: "New Routes Integration",
            short_description: "One-to-one English support and social groups for new arrivals",
            contact_email: Some("info@newroutes.org.uk"),
            contact_phone: Some("01603 496623"),
            website: "https://newroutes.org.uk",
            is_free: true,
            is_accredited: false,
            is_drop_in: false,
            is_online: true,
            schedule: "By arrangement with a volunteer tutor",
        },
        Provider {
            region: Region::Yarmouth,
            name: "East Coast College ESOL",
            short_description: "Accredited ESOL qualifications with exam preparation",
            contact_email: Some("esol@eastcoast.ac.uk"),
            contact_phone: Some("01493 655261"),
            website: "https://www.eastcoast.ac.uk/esol",
            is_free: false,
            is_accredited: true,
            is_drop_in: false,
            is_online: false,
            schedule: "Weekdays, term time",
        },
        Provider {
            region: Region::Yarmouth,
            name: "GYROS Community English",
            short_description: "Free informal classes and advice for migrant communities",
            contact_email: Some("contact@gyros.org.uk"),
            contact_phone: Some("01493 745260"),
            website: "https://gyros.org.uk",
            is_free: true,
            is_accredited: false,
            is_drop_in: true,
            is_online: false,
            schedule: "Tuesdays and Fridays, mornings",
        },
        Provider {
            region: Region::Yarmouth,
            name: "Yarmouth Library Talk English",
            short_description: "Drop-in speaking practice led by trained volunteers",
            contact_email: None,
            contact_phone: Some("01493 844551"),
            website: "https://www.norfolk.gov.uk/libraries",
            is_free: true,
            is_accredited: false,
            is_drop_in: true,
            is_online: false,
            schedule: "Saturdays 10:30-12:00",
        },
    ]
});

/// Providers matching the filter, in catalog order.
pub fn providers_in(filter: RegionFilter) -> Vec<&'static Provider> {
    PROVIDERS
        .iter()
        .filter(|p| filter.matches(p.region))
        .collect()
}
