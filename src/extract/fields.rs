use crate::browser::Page;
use crate::error::Result;
use crate::model::{PageMetrics, UNKNOWN_PROJECT};
use crate::settings::MetricLabels;

/// Label → value pairs in the order they were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabeledFields(Vec<(String, Option<String>)>);

impl LabeledFields {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(l, _)| l == label)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(l, _)| l.as_str())
    }
}

/// Positional pairing over a flattened label stream.
///
/// The site renders each metric as two sibling elements, label then value.
/// For each requested label the first element whose trimmed text equals it
/// exactly is the label; the element right after it is the value. A missing
/// label, a label at the end of the stream, or a blank value all yield `None`.
pub fn pair_labels<S: AsRef<str>>(stream: &[S], labels: &[&str]) -> LabeledFields {
    let pairs = labels
        .iter()
        .map(|&label| {
            let value = stream
                .iter()
                .position(|s| s.as_ref().trim() == label)
                .and_then(|i| stream.get(i + 1))
                .map(|v| v.as_ref().trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            (label.to_string(), value)
        })
        .collect();
    LabeledFields(pairs)
}

pub async fn extract_labeled_fields(
    page: &dyn Page,
    label_selector: &str,
    labels: &[&str],
) -> Result<LabeledFields> {
    let stream = page.element_texts(label_selector).await?;
    Ok(pair_labels(&stream, labels))
}

impl PageMetrics {
    pub fn from_fields(fields: &LabeledFields, labels: &MetricLabels) -> Self {
        let take = |label: &str| fields.get(label).map(str::to_string);
        Self {
            price_usd: take(&labels.price_usd),
            price_native: take(&labels.price_native),
            liquidity: take(&labels.liquidity),
            fdv: take(&labels.fdv),
            market_cap: take(&labels.market_cap),
        }
    }
}

/// Trimmed text of the first heading match, or the "Unknown Project" default.
pub async fn project_name(page: &dyn Page, heading_selector: &str) -> Result<String> {
    let headings = page.element_texts(heading_selector).await?;
    Ok(headings
        .first()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
        .unwrap_or(UNKNOWN_PROJECT)
        .to_string())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakePage;

    const LABELS: [&str; 5] = ["Price USD", "Price", "Liquidity", "FDV", "Mkt Cap"];

    #[test]
    fn value_is_next_element() {
        let stream = ["PEPE", "Price USD", " $0.0042 ", "Price", "0.0000071 WBNB"];
        let f = pair_labels(&stream, &LABELS);
        assert_eq!(f.get("Price USD"), Some("$0.0042"));
        assert_eq!(f.get("Price"), Some("0.0000071 WBNB"));
        assert_eq!(f.get("FDV"), None);
    }

    #[test]
    fn first_occurrence_of_label_wins() {
        let stream = ["Liquidity", "$120K", "Liquidity", "$999K"];
        let f = pair_labels(&stream, &["Liquidity"]);
        assert_eq!(f.get("Liquidity"), Some("$120K"));
    }

    #[test]
    fn label_must_match_exactly_after_trim() {
        // "Price" must not match "Price USD" and vice versa
        let stream = ["Price USD", "$1.00", " Price\n", "2 WBNB"];
        let f = pair_labels(&stream, &["Price", "Price USD"]);
        assert_eq!(f.get("Price"), Some("2 WBNB"));
        assert_eq!(f.get("Price USD"), Some("$1.00"));
    }

    #[test]
    fn trailing_label_and_blank_value_are_absent() {
        let stream = ["FDV", "  ", "Mkt Cap"];
        let f = pair_labels(&stream, &["FDV", "Mkt Cap"]);
        assert_eq!(f.get("FDV"), None);
        assert_eq!(f.get("Mkt Cap"), None);
        assert_eq!(f.missing().collect::<Vec<_>>(), vec!["FDV", "Mkt Cap"]);
    }

    #[test]
    fn each_metric_misses_independently() {
        let stream = ["Price USD", "$0.0042", "Liquidity", "$88K", "Mkt Cap", "$1.1M"];
        let f = pair_labels(&stream, &LABELS);
        let m = PageMetrics::from_fields(&f, &MetricLabels::default());
        assert_eq!(m.price_usd.as_deref(), Some("$0.0042"));
        assert_eq!(m.price_native, None);
        assert_eq!(m.liquidity.as_deref(), Some("$88K"));
        assert_eq!(m.fdv, None);
        assert_eq!(m.market_cap.as_deref(), Some("$1.1M"));
    }

    #[tokio::test]
    async fn extraction_is_idempotent() {
        let page = FakePage::default().with_texts(
            "span",
            &["Price USD", "$0.0042", "FDV", "$4.2M", "Liquidity", "$310K"],
        );
        let first = extract_labeled_fields(&page, "span", &LABELS).await.unwrap();
        let second = extract_labeled_fields(&page, "span", &LABELS).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            PageMetrics::from_fields(&first, &MetricLabels::default()),
            PageMetrics::from_fields(&second, &MetricLabels::default())
        );
    }

    #[tokio::test]
    async fn project_name_defaults() {
        let page = FakePage::default();
        assert_eq!(project_name(&page, "h2.chakra-heading").await.unwrap(), "Unknown Project");

        let page =
            FakePage::default().with_texts("h2.chakra-heading", &["  PEPE / WBNB ", "Other"]);
        assert_eq!(project_name(&page, "h2.chakra-heading").await.unwrap(), "PEPE / WBNB");

        let page = FakePage::default().with_texts("h2.chakra-heading", &["   "]);
        assert_eq!(project_name(&page, "h2.chakra-heading").await.unwrap(), "Unknown Project");
    }
}
