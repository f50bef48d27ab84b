//! schema.org JSON-LD for prerendered pages.

use muv_seo_core::{RouteDescriptor, SiteConfig};
use serde_json::{Value, json};

/// JSON-LD document for a route.
///
/// The home page describes the gym itself; every other route is a
/// `WebPage` that belongs to the site.
pub fn json_ld_for(route: &RouteDescriptor, site: &SiteConfig) -> Value {
    let url = site.absolute_url(&route.path);

    if route.path == "/" {
        let mut business = json!({
            "@context": "https://schema.org",
            "@type": "HealthClub",
            "name": site.name,
            "url": url,
            "description": route.description,
            "logo": site.absolute_url("/logo.png"),
            "address": {
                "@type": "PostalAddress",
                "addressLocality": "Legnago",
                "addressRegion": "VR",
                "postalCode": "37045",
                "addressCountry": "IT"
            },
            "areaServed": "Legnago"
        });
        if let Some(image) = route.og_image.as_ref().or(site.default_og_image.as_ref()) {
            business["image"] = json!(absolute(site, image));
        }
        if let Some(phone) = &site.telephone {
            business["telephone"] = json!(phone);
        }
        return business;
    }

    json!({
        "@context": "https://schema.org",
        "@type": "WebPage",
        "name": route.title,
        "description": route.description,
        "url": url,
        "inLanguage": site.language,
        "isPartOf": {
            "@type": "WebSite",
            "name": site.name,
            "url": site.absolute_url("/")
        }
    })
}

/// Wrap a JSON-LD value in a script tag safe to embed in HTML.
pub fn script_tag(value: &Value) -> String {
    let body = value.to_string().replace("</", "<\\/");
    format!(r#"<script type="application/ld+json">{}</script>"#, body)
}

pub(crate) fn absolute(site: &SiteConfig, url: &str) -> String {
    if url.starts_with("https://") || url.starts_with("http://") {
        url.to_string()
    } else {
        site.absolute_url(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muv_seo_core::ChangeFreq;

    fn site() -> SiteConfig {
        SiteConfig {
            base_url: "https://www.muvfitness.it".to_string(),
            name: "MUV Fitness".to_string(),
            language: "it".to_string(),
            default_og_image: Some("https://www.muvfitness.it/og-image.jpg".to_string()),
            twitter_handle: None,
            telephone: Some("+39 0442 000000".to_string()),
        }
    }

    fn route(path: &str) -> RouteDescriptor {
        RouteDescriptor {
            path: path.to_string(),
            title: "Chi siamo".to_string(),
            description: "Il team".to_string(),
            keywords: None,
            priority: 0.8,
            changefreq: ChangeFreq::Monthly,
            lastmod: None,
            og_image: None,
        }
    }

    #[test]
    fn test_home_is_health_club() {
        let ld = json_ld_for(&route("/"), &site());
        assert_eq!(ld["@type"], "HealthClub");
        assert_eq!(ld["address"]["addressLocality"], "Legnago");
        assert_eq!(ld["telephone"], "+39 0442 000000");
        assert_eq!(ld["image"], "https://www.muvfitness.it/og-image.jpg");
    }

    #[test]
    fn test_other_routes_are_web_pages() {
        let ld = json_ld_for(&route("/chi-siamo"), &site());
        assert_eq!(ld["@type"], "WebPage");
        assert_eq!(ld["url"], "https://www.muvfitness.it/chi-siamo");
        assert_eq!(ld["isPartOf"]["url"], "https://www.muvfitness.it/");
    }

    #[test]
    fn test_script_tag_escapes_closing_tags() {
        let mut r = route("/x");
        r.description = "</script><script>alert(1)".to_string();
        let tag = script_tag(&json_ld_for(&r, &site()));
        assert!(tag.starts_with(r#"<script type="application/ld+json">"#));
        assert_eq!(tag.matches("</script>").count(), 1);
    }
}
