//! Page metadata for search engines and social previews.

use serde::Serialize;
use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use url::Url;

/// Site-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMeta {
    pub title: String,
    pub site_name: String,
    pub description: String,
    /// Absolute base URL without a trailing slash.
    pub url: String,
    pub image: String,
    /// Endpoint rendering Open Graph images from query parameters.
    pub og_image_endpoint: Option<String>,
    pub twitter_site: String,
    pub author: String,
    pub robots: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: "quire".to_string(),
            site_name: "quire".to_string(),
            description: String::new(),
            url: "http://localhost:3000".to_string(),
            image: String::new(),
            og_image_endpoint: None,
            twitter_site: String::new(),
            author: String::new(),
            robots: "follow, index".to_string(),
        }
    }
}

/// Per-page overrides.
#[derive(Debug, Clone, Default)]
pub struct SeoInput {
    pub template_title: Option<String>,
    pub description: Option<String>,
    pub pathname: String,
    pub canonical: Option<String>,
    pub date: Option<OffsetDateTime>,
    pub is_blog: bool,
    pub banner: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub url: String,
    pub canonical: String,
    pub robots: String,
    pub og_type: &'static str,
    pub site_name: String,
    pub image: String,
    pub twitter_card: &'static str,
    pub twitter_site: String,
    pub published_time: Option<String>,
    pub author: Option<String>,
    pub json_ld: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaAttribute {
    Name,
    Property,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaTag {
    pub attribute: MetaAttribute,
    pub key: &'static str,
    pub content: String,
}

impl PageMeta {
    pub fn build(site: &SiteMeta, input: &SeoInput) -> Self {
        let template = input
            .template_title
            .as_deref()
            .filter(|title| !title.trim().is_empty());
        let title = match template {
            Some(template) => format!("{template} | {}", site.site_name),
            None => site.title.clone(),
        };
        let description = input
            .description
            .clone()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| site.description.clone());
        let url = format!("{}{}", site.url.trim_end_matches('/'), input.pathname);
        let canonical = input
            .canonical
            .clone()
            .filter(|canonical| !canonical.is_empty())
            .unwrap_or_else(|| url.clone());
        let image = og_image(site, input, template, &description);
        let published_time = input
            .date
            .and_then(|date| date.format(&Rfc3339).ok());
        let author = published_time
            .as_ref()
            .map(|_| site.author.clone())
            .filter(|author| !author.is_empty());

        let json_ld = input.is_blog.then(|| {
            json!({
                "@context": "https://schema.org",
                "@type": "BlogPosting",
                "headline": title,
                "description": description,
                "author": [{ "@type": "Person", "name": site.author }],
                "image": image,
                "datePublished": published_time,
            })
        });

        Self {
            title,
            description,
            url,
            canonical,
            robots: site.robots.clone(),
            og_type: "website",
            site_name: site.site_name.clone(),
            image,
            twitter_card: "summary_large_image",
            twitter_site: site.twitter_site.clone(),
            published_time,
            author,
            json_ld,
        }
    }

    /// Flatten into `<meta>` triples in document order.
    pub fn meta_tags(&self) -> Vec<MetaTag> {
        use MetaAttribute::{Name, Property};

        let mut tags = vec![
            tag(Name, "robots", &self.robots),
            tag(Name, "description", &self.description),
            tag(Property, "og:url", &self.url),
            tag(Property, "og:type", self.og_type),
            tag(Property, "og:site_name", &self.site_name),
            tag(Property, "og:description", &self.description),
            tag(Property, "og:title", &self.title),
            tag(Property, "og:image", &self.image),
            tag(Name, "twitter:card", self.twitter_card),
            tag(Name, "twitter:site", &self.twitter_site),
            tag(Name, "twitter:title", &self.title),
            tag(Name, "twitter:description", &self.description),
            tag(Name, "twitter:image", &self.image),
        ];

        if let Some(published) = &self.published_time {
            tags.push(tag(Property, "article:published_time", published));
            tags.push(tag(Property, "og:publish_date", published));
            if let Some(author) = &self.author {
                tags.push(tag(Property, "article:author", author));
            }
        }

        tags
    }
}

fn tag(attribute: MetaAttribute, key: &'static str, content: &str) -> MetaTag {
    MetaTag {
        attribute,
        key,
        content: content.to_string(),
    }
}

fn og_image(site: &SiteMeta, input: &SeoInput, template: Option<&str>, description: &str) -> String {
    let banner = input.banner.as_deref().filter(|banner| !banner.is_empty());

    let Some(mut endpoint) = site
        .og_image_endpoint
        .as_deref()
        .and_then(|endpoint| Url::parse(endpoint).ok())
    else {
        return banner.unwrap_or(site.image.as_str()).to_string();
    };

    {
        let mut query = endpoint.query_pairs_mut();
        query.append_pair("description", description);
        query.append_pair(
            "siteName",
            if template.is_some() {
                &site.site_name
            } else {
                &site.title
            },
        );
        if let Some(template) = template {
            query.append_pair("templateTitle", template);
        }
        if let Some(banner) = banner {
            query.append_pair("banner", banner);
        }
        if input.is_blog {
            query.append_pair("isBlog", "true");
        }
        if !input.tags.is_empty() {
            query.append_pair("tags", &input.tags.join(","));
        }
    }

    endpoint.into()
}
