//! Shared fixtures: a reimbursement form built from snapshots.

#![allow(dead_code)]

use std::sync::Arc;

use autofill_core_types::{FieldName, ParsedRecord};
use host_dom::{el, DomEvent, DomEventKind, Document, HostPage, HostScript, NodeSnapshot, PageSnapshot};

pub const URL: &str = "https://forms.example/reimbursement";

pub fn text_group(label: &str, id: &str) -> NodeSnapshot {
    el("div").class("form-group").children([
        el("label").attr("for", id).text(label),
        el("input").attr("type", "text").id(id),
    ])
}

pub fn prefilled_group(label: &str, id: &str, value: &str) -> NodeSnapshot {
    el("div").class("form-group").children([
        el("label").attr("for", id).text(label),
        el("input").attr("type", "text").id(id).attr("value", value),
    ])
}

pub fn date_group(label: &str, id: &str) -> NodeSnapshot {
    el("div").class("form-group").children([
        el("label").attr("for", id).text(label),
        el("input").attr("type", "date").id(id),
    ])
}

pub fn textarea_group(label: &str, id: &str) -> NodeSnapshot {
    el("div").class("form-group").children([
        el("label").attr("for", id).text(label),
        el("textarea").id(id),
    ])
}

pub fn select_group(label: &str, id: &str, options: &[&str]) -> NodeSnapshot {
    let mut select = el("select")
        .id(id)
        .child(el("option").attr("value", "").text("Select..."));
    for option in options {
        select = select.child(el("option").attr("value", option).text(option));
    }
    el("div")
        .class("form-group")
        .children([el("label").attr("for", id).text(label), select])
}

pub fn radio_group(legend: &str, name: &str, choices: &[(&str, &str)]) -> NodeSnapshot {
    let mut group = el("fieldset").child(el("legend").text(legend));
    for (id, label) in choices {
        group = group.child(
            el("div").children([
                el("input").attr("type", "radio").attr("name", name).id(id).attr("value", id),
                el("label").attr("for", id).text(label),
            ]),
        );
    }
    group
}

pub fn payment_group() -> NodeSnapshot {
    radio_group(
        "Payment Method",
        "payment",
        &[
            ("pm-with", "Club Spending Card (with additional funding)"),
            ("pm-without", "Club Spending Card (without additional funding)"),
            ("pm-oop", "Out of pocket"),
        ],
    )
}

pub fn purchase_type_group() -> NodeSnapshot {
    radio_group(
        "Purchase Type",
        "ptype",
        &[
            ("pt-food", "Food"),
            ("pt-supplies", "Supplies"),
            ("pt-travel", "Travel"),
            ("pt-other", "Other"),
        ],
    )
}

pub fn next_button() -> NodeSnapshot {
    el("button").id("next").attr("type", "button").text("Next")
}

/// All ten fields plus a Next button.
pub fn full_form() -> NodeSnapshot {
    el("body").child(el("form").id("reimbursement").children([
        text_group("Purchaser's Name *", "purchaser"),
        text_group("Net ID", "netid"),
        select_group("Club Name", "club", &["Chess Club", "Robotics Club"]),
        payment_group(),
        text_group("Vendor Name", "vendor"),
        date_group("Date of Purchase", "date"),
        text_group("Total Amount ($)", "amount"),
        purchase_type_group(),
        text_group("Event Link (if applicable)", "event"),
        textarea_group("Description / Business Purpose", "description"),
        next_button(),
    ]))
}

/// The six receipt fields only; the profile fields live elsewhere.
pub fn receipt_form() -> NodeSnapshot {
    receipt_form_with_vendor(text_group("Vendor Name", "vendor"))
}

pub fn receipt_form_with_vendor(vendor: NodeSnapshot) -> NodeSnapshot {
    el("body").child(el("form").children([
        payment_group(),
        vendor,
        text_group("Total Amount ($)", "amount"),
        purchase_type_group(),
        text_group("Event Link (if applicable)", "event"),
        textarea_group("Description / Business Purpose", "description"),
    ]))
}

pub fn upload_group() -> NodeSnapshot {
    el("div").class("form-group").children([
        el("label").attr("for", "receipt-input").text("Receipt Upload"),
        el("input").attr("type", "file").id("receipt-input"),
    ])
}

pub fn document(body: NodeSnapshot) -> Document {
    Document::from_snapshot(&PageSnapshot {
        url: URL.into(),
        body,
    })
    .unwrap()
}

pub fn page(body: NodeSnapshot) -> Arc<HostPage> {
    HostPage::new(document(body))
}

/// A page whose own script records uploads the way a real host does.
pub fn page_with_upload_handler(body: NodeSnapshot) -> Arc<HostPage> {
    let mut doc = document(body);
    doc.install_script(Arc::new(UploadHandler));
    HostPage::new(doc)
}

pub fn node(doc: &Document, id: &str) -> host_dom::NodeId {
    doc.get_element_by_id(id)
        .unwrap_or_else(|| panic!("no element #{id}"))
}

pub fn value_of(doc: &Document, id: &str) -> String {
    doc.value(node(doc, id)).unwrap_or("").to_string()
}

pub fn is_checked(doc: &Document, id: &str) -> bool {
    doc.element(node(doc, id)).is_some_and(|el| el.is_checked())
}

/// The record from the first documented scenario.
pub fn scenario_record() -> ParsedRecord {
    ParsedRecord::new()
        .with(FieldName::VendorName, "Acme", 0.95)
        .with(FieldName::TotalAmount, 42.50, 0.95)
        .with(FieldName::PurchaseType, "food", 0.9)
        .with(FieldName::PaymentMethod, "out_of_pocket", 0.9)
        .with(FieldName::EventLink, "", 0.0)
        .with(FieldName::Description, "Lunch for club meeting", 0.7)
}

/// Host upload handler: stores the chosen file's name in a hidden field.
pub struct UploadHandler;

impl HostScript for UploadHandler {
    fn name(&self) -> &str {
        "test-upload-handler"
    }

    fn on_event(&self, doc: &mut Document, event: &DomEvent) {
        if event.kind != DomEventKind::Change {
            return;
        }
        let Some(name) = doc
            .element(event.target)
            .and_then(|el| el.files().first())
            .map(|file| file.name.clone())
        else {
            return;
        };
        let field = doc.create_element("input");
        doc.set_attr(field, "type", "hidden").unwrap();
        doc.set_attr(field, "name", "receipt_file").unwrap();
        doc.set_value(field, &name).unwrap();
        let body = doc.body();
        doc.append_child(body, field).unwrap();
    }
}

/// The scenario record plus the profile-backed fields.
pub fn profile_record() -> ParsedRecord {
    scenario_record()
        .with(FieldName::PurchaserName, "Jordan Lee", 1.0)
        .with(FieldName::NetId, "jl123", 1.0)
        .with(FieldName::ClubName, "Chess Club", 1.0)
}

/// First page of the host flow: who is asking, then "Next".
pub fn profile_page() -> NodeSnapshot {
    el("body").child(el("form").id("step-1").children([
        text_group("Purchaser's Name *", "purchaser"),
        text_group("Net ID", "netid"),
        select_group("Club Name", "club", &["Chess Club", "Robotics Club"]),
        next_button(),
    ]))
}

/// Appends `snapshot` to the body the way a host script would.
pub fn append_to_body(page: &HostPage, snapshot: &NodeSnapshot) {
    page.with_document(|doc| {
        let body = doc.body();
        doc.load_into(body, snapshot)
    })
    .unwrap();
}
