//! In-page data injection.
//!
//! The injection script runs inside the target page's own script context and
//! maps the payload onto the page's named form fields, dispatching the
//! standard `input` event after each write so the page's listeners recompute
//! dependent state. The page is a foreign environment: any of its optional
//! routines (`addProductItem`, `updateInvoicePreview`) may be missing, and
//! every such capability is probed before use — absence is a normal branch,
//! never an error. The page's logo is deliberately never written; the asset
//! shipped with the deployed page is always kept.

use crate::engine::RenderEngine;
use crate::error::{AddContext, Category, Error};
use crate::invoice::Payload;

/// Body of the injection call, executed with the serialized [`Payload`] as
/// `arguments[0]`. Field ids, container id, and fallback item markup follow
/// the deployed invoice page's own naming.
const APPLY_PAYLOAD_SCRIPT: &str = r#"
var data = arguments[0] || {};

function setField(id, value) {
  var el = document.getElementById(id);
  if (!el || value === undefined || value === null) { return; }
  el.value = value;
  el.dispatchEvent(new Event('input', { bubbles: true }));
}

function escapeAttr(value) {
  if (value === undefined || value === null) { return ''; }
  return String(value).replace(/"/g, '&quot;');
}

if (data.seller) {
  setField('sellerName', data.seller.name);
  setField('sellerAddress', data.seller.address);
  setField('sellerTaxCode', data.seller.taxCode);
  setField('sellerPhone', data.seller.phone);
}
if (data.buyer) {
  setField('buyerName', data.buyer.name);
  setField('buyerAddress', data.buyer.address);
  setField('buyerTaxCode', data.buyer.taxCode);
  setField('buyerPhone', data.buyer.phone);
}
if (data.invoice) {
  setField('invoiceNumber', data.invoice.number);
  setField('invoiceDate', data.invoice.date);
  setField('paymentMethod', data.invoice.paymentMethod);
  setField('taxRate', data.invoice.taxRate);
  setField('seriesInput', data.invoice.series);
}

if (Array.isArray(data.products) && data.products.length) {
  var list = document.getElementById('productList');
  if (list) {
    list.innerHTML = '';
    if (typeof addProductItem === 'function') {
      data.products.forEach(function (p) {
        addProductItem(p.name || '', p.quantity || 1, p.price || 0, p.unit || '');
      });
    } else {
      data.products.forEach(function (p, idx) {
        var item = document.createElement('div');
        item.className = 'product-item';
        item.innerHTML =
          '<div class="product-header"><div class="product-title">Sản phẩm #' + (idx + 1) + '</div></div>' +
          '<div class="product-grid">' +
          '<div class="form-group"><label>Tên sản phẩm</label><input type="text" class="product-name" value="' + escapeAttr(p.name) + '"></div>' +
          '<div class="form-group"><label>Số lượng</label><input type="number" class="product-quantity" min="0" value="' + (p.quantity || 0) + '"></div>' +
          '<div class="form-group"><label>Đơn giá</label><input type="number" class="product-price" min="0" value="' + (p.price || 0) + '"></div>' +
          '<div class="form-group"><label>Đơn vị</label><input type="text" class="product-unit" value="' + escapeAttr(p.unit) + '"></div>' +
          '</div>';
        list.appendChild(item);
      });
    }
  }
}

if (typeof updateInvoicePreview === 'function') {
  updateInvoicePreview();
} else {
  ['sellerName', 'buyerName', 'invoiceNumber', 'invoiceDate', 'taxRate', 'seriesInput'].forEach(function (id) {
    var el = document.getElementById(id);
    if (el) { el.dispatchEvent(new Event('input', { bubbles: true })); }
  });
}
return true;
"#;

/// Write the payload into the loaded page and trigger its recompute hooks
///
/// # Errors
/// [`Error`] with the `Injection` category if the payload cannot be
/// serialized or the page raises a script exception
pub async fn apply(engine: &mut dyn RenderEngine, payload: &Payload) -> Result<(), Error> {
    let value = serde_json::to_value(payload)
        .map_err(Error::from)
        .map_err(|e| e.categorize(Category::Injection))
        .add_context("serializing invoice payload")?;
    engine
        .evaluate(APPLY_PAYLOAD_SCRIPT, vec![value])
        .await
        .add_context("applying invoice payload to page")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{PartyBuilder, PayloadBuilder};
    use crate::mock::{FailAt, MockFactory};
    use crate::engine::{EngineFactory, Viewport};

    #[tokio::test]
    async fn payload_reaches_the_page_context_intact() {
        let factory = MockFactory::new();
        let mut engine = factory.launch(Viewport::default()).await.unwrap();
        let payload = PayloadBuilder::default()
            .seller(PartyBuilder::default().name("Acme Co").build().unwrap())
            .build()
            .unwrap();

        apply(engine.as_mut(), &payload).await.unwrap();

        let evaluations = factory.state.evaluations();
        assert_eq!(evaluations.len(), 1);
        let (script, args) = &evaluations[0];
        assert_eq!(args.len(), 1);
        assert_eq!(args[0]["seller"]["name"], "Acme Co");
        assert!(script.contains("setField('sellerName'"));
    }

    #[tokio::test]
    async fn script_failures_carry_the_injection_category() {
        let factory = MockFactory::failing_at(FailAt::Evaluate);
        let mut engine = factory.launch(Viewport::default()).await.unwrap();
        let err = apply(engine.as_mut(), &Payload::default()).await.unwrap_err();
        assert_eq!(err.category(), Category::Injection);
    }

    #[test]
    fn script_probes_optional_page_routines_before_calling_them() {
        assert!(APPLY_PAYLOAD_SCRIPT.contains("typeof addProductItem === 'function'"));
        assert!(APPLY_PAYLOAD_SCRIPT.contains("typeof updateInvoicePreview === 'function'"));
    }

    #[test]
    fn fallback_markup_escapes_attribute_quotes() {
        assert!(APPLY_PAYLOAD_SCRIPT.contains("escapeAttr(p.name)"));
        assert!(APPLY_PAYLOAD_SCRIPT.contains("escapeAttr(p.unit)"));
        assert!(APPLY_PAYLOAD_SCRIPT.contains(r#".replace(/"/g, '&quot;')"#));
    }

    #[test]
    fn script_never_writes_a_logo_field() {
        assert!(!APPLY_PAYLOAD_SCRIPT.contains("logo"));
        assert!(!APPLY_PAYLOAD_SCRIPT.contains("Logo"));
    }

    #[test]
    fn product_rebuild_is_guarded_on_the_container_and_the_sequence() {
        assert!(APPLY_PAYLOAD_SCRIPT.contains("Array.isArray(data.products)"));
        assert!(APPLY_PAYLOAD_SCRIPT.contains("getElementById('productList')"));
    }
}
