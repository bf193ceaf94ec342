use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Named collections of the site's relational store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Programs,
    Tags,
    ProgramTags,
    Articles,
    SiteSettings,
    NewsTicker,
    AhkamCards,
    AhkamSlider,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Programs,
        Collection::Tags,
        Collection::ProgramTags,
        Collection::Articles,
        Collection::SiteSettings,
        Collection::NewsTicker,
        Collection::AhkamCards,
        Collection::AhkamSlider,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            Collection::Programs => "programs",
            Collection::Tags => "tags",
            Collection::ProgramTags => "program_tags",
            Collection::Articles => "articles",
            Collection::SiteSettings => "site_settings",
            Collection::NewsTicker => "news_ticker",
            Collection::AhkamCards => "ahkam_cards",
            Collection::AhkamSlider => "ahkam_slider",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.table_name())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.table_name() == s.trim())
            .ok_or_else(|| format!("Unknown collection: {}", s))
    }
}
