//! Invoice request and payload types.
//!
//! This module defines the wire shape accepted by the render pipeline: a
//! [`RenderRequest`] carrying an optional target url, an optional
//! [`Payload`], and an optional output filename. Every payload field is
//! independently optional; the target page supplies defaults for anything
//! absent and performs all recomputation itself, so no totals or derived
//! values live here. Builders are derived for constructing instances
//! programmatically.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::Error;

const DEFAULT_BASENAME: &str = "invoice";
const PDF_EXTENSION: &str = ".pdf";

/// A party involved in the invoice (seller or buyer)
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned", default)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Invoice header fields
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned", default)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
}

/// A single product entry. Order within [`Payload::products`] is significant
/// and is reproduced 1:1 in the rendered list.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned", default)]
#[serde(rename_all = "camelCase")]
pub struct ProductLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Invoice data to be written into the target page. Immutable once received;
/// the pipeline never writes any field back.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned", default)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<ProductLine>>,
}

/// A complete render request as received at the boundary
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned", default)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl RenderRequest {
    /// Resolve the target page url: the request's own `url` field wins,
    /// falling back to the deployment-wide default.
    ///
    /// # Errors
    /// [`Error`] with the `Validation` category if neither the request nor
    /// the deployment provides a non-empty url
    pub fn resolve_url(&self, default_url: Option<&str>) -> Result<String, Error> {
        self.url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| default_url.filter(|u| !u.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| {
                Error::validation("Missing INVOICE_HTML_URL and no url provided in body.")
            })
    }

    /// Derive the download filename: the explicit `filename` field, else the
    /// invoice number, else `invoice`, always suffixed with `.pdf`.
    pub fn pdf_filename(&self) -> String {
        let basename = self
            .filename
            .as_deref()
            .filter(|f| !f.is_empty())
            .or_else(|| {
                self.data
                    .as_ref()
                    .and_then(|d| d.invoice.as_ref())
                    .and_then(|i| i.number.as_deref())
                    .filter(|n| !n.is_empty())
            })
            .unwrap_or(DEFAULT_BASENAME);
        format!("{basename}{PDF_EXTENSION}")
    }

    /// The payload to inject; an absent `data` field means "render template
    /// defaults", which injection expresses as an empty payload.
    pub fn payload(&self) -> Payload {
        self.data.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_url_prefers_the_request_field() {
        let request = RenderRequestBuilder::default()
            .url("https://invoices.example.com/form")
            .build()
            .unwrap();
        let url = request
            .resolve_url(Some("https://fallback.example.com"))
            .unwrap();
        assert_eq!(url, "https://invoices.example.com/form");
    }

    #[test]
    fn resolve_url_falls_back_to_the_deployment_default() {
        let request = RenderRequest::default();
        let url = request
            .resolve_url(Some("https://fallback.example.com"))
            .unwrap();
        assert_eq!(url, "https://fallback.example.com");
    }

    #[test]
    fn resolve_url_rejects_a_request_with_no_url_anywhere() {
        let request = RenderRequest::default();
        assert!(request.resolve_url(None).is_err());

        let blank = RenderRequestBuilder::default().url("").build().unwrap();
        assert!(blank.resolve_url(Some("")).is_err());
    }

    #[test]
    fn filename_prefers_the_explicit_field() {
        let request = RenderRequestBuilder::default()
            .filename("statement-march")
            .data(
                PayloadBuilder::default()
                    .invoice(InvoiceMetaBuilder::default().number("INV-7").build().unwrap())
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        assert_eq!(request.pdf_filename(), "statement-march.pdf");
    }

    #[test]
    fn filename_falls_back_to_the_invoice_number() {
        let request = RenderRequestBuilder::default()
            .data(
                PayloadBuilder::default()
                    .invoice(InvoiceMetaBuilder::default().number("INV-7").build().unwrap())
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        assert_eq!(request.pdf_filename(), "INV-7.pdf");
    }

    #[test]
    fn filename_defaults_when_nothing_is_provided() {
        assert_eq!(RenderRequest::default().pdf_filename(), "invoice.pdf");
    }

    #[test]
    fn request_deserializes_from_the_wire_shape() {
        let raw = r#"{
            "url": "https://invoices.example.com/form",
            "filename": "march",
            "data": {
                "seller": { "name": "Acme Co", "taxCode": "0312345678" },
                "invoice": { "number": "INV-7", "paymentMethod": "TM/CK", "taxRate": 8 },
                "products": [
                    { "name": "Widget", "quantity": 2, "price": 150000, "unit": "cái" },
                    { "name": "Gadget", "quantity": 1, "price": 99000 }
                ]
            }
        }"#;
        let request: RenderRequest = serde_json::from_str(raw).unwrap();
        let payload = request.payload();
        let seller = payload.seller.as_ref().unwrap();
        assert_eq!(seller.name.as_deref(), Some("Acme Co"));
        assert_eq!(seller.tax_code.as_deref(), Some("0312345678"));
        assert_eq!(
            payload.invoice.as_ref().unwrap().tax_rate,
            Some(8.0)
        );

        let products = payload.products.as_ref().unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name.as_deref(), Some("Widget"));
        assert_eq!(products[1].name.as_deref(), Some("Gadget"));
    }

    #[test]
    fn product_order_survives_a_serialization_round() {
        let payload = PayloadBuilder::default()
            .products(vec![
                ProductLineBuilder::default().name("first").build().unwrap(),
                ProductLineBuilder::default().name("second").build().unwrap(),
                ProductLineBuilder::default().name("third").build().unwrap(),
            ])
            .build()
            .unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        let names: Vec<_> = value["products"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn absent_fields_are_not_serialized_for_injection() {
        let payload = PayloadBuilder::default()
            .seller(PartyBuilder::default().name("Acme Co").build().unwrap())
            .build()
            .unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("buyer").is_none());
        assert!(value.get("products").is_none());
        assert!(value["seller"].get("phone").is_none());
    }
}
