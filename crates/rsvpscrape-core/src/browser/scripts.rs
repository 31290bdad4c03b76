//! Page scripts run through `execute/sync`.
//!
//! Each script is a function body; values passed from Rust arrive as `arguments[n]`.

/// CSS for the primary click target of row `position` (zero-based)
pub fn primary_name_selector(position: usize) -> String {
    format!(
        "table tbody tr:nth-child({}) td:nth-child(2) .primary-guest-name",
        position + 1
    )
}

/// Row count plus the visible text of the name cell at `arguments[0]`
pub const ROW_INFO: &str = r#"
const cells = document.querySelectorAll('table tbody tr td:nth-child(2)');
const index = arguments[0];
if (index >= cells.length) return { rows: cells.length, text: null };
const cell = cells[index];
cell.scrollIntoView({ block: 'center' });
return { rows: cells.length, text: cell.innerText || '' };
"#;

/// Broader click used when the native click did not open the detail view
pub const FALLBACK_CLICK: &str = r#"
const rows = document.querySelectorAll('table tbody tr');
const index = arguments[0];
if (index >= rows.length) return false;
const cell = rows[index].querySelector('td:nth-child(2)');
if (!cell) return false;
const target = cell.querySelector('.primary-guest-name')
    || cell.querySelector('[class*="name"]')
    || cell.querySelector('a');
(target || cell).click();
return true;
"#;

pub const MODAL_PRESENT: &str = r#"
return document.querySelector('dialog, [role="dialog"]') !== null;
"#;

/// Click the tab whose caption equals `arguments[0]`
pub const CLICK_TAB: &str = r#"
const modal = document.querySelector('.modal-content');
if (!modal) return false;
for (const tab of modal.querySelectorAll('nav ul li a, .tabs-label a')) {
    if (tab.textContent.trim() === arguments[0]) {
        tab.click();
        return true;
    }
}
return false;
"#;

pub const RESPONSES_READY: &str = r#"
if (document.querySelectorAll('.accordion-section').length > 0) return true;
if (document.querySelectorAll('h4[role="button"] span').length > 0) return true;
return document.querySelectorAll('select[name*="rsvp_type"]').length > 0;
"#;

/// Expand every collapsed event section; returns how many were clicked
pub const EXPAND_SECTIONS: &str = r#"
let count = 0;
for (const header of document.querySelectorAll('.accordion-section h4[role="button"]')) {
    const section = header.closest('.accordion-section');
    if (section && !section.classList.contains('selected')) {
        header.click();
        count++;
    }
}
return count;
"#;

/// Identity panel: text inputs, relationship text near its label, checked event boxes.
/// `arguments[0]` lists principal names that a relationship value mentions.
pub const IDENTITY: &str = r#"
const principals = arguments[0].map(p => p.toLowerCase());
const modal = document.querySelector('.modal-content, dialog, [role="dialog"]');
const values = modal
    ? Array.from(modal.querySelectorAll('input[type="text"]')).map(t => t.value.trim())
    : [];

let relationship = '';
const labels = Array.from(document.querySelectorAll('label, span, div'))
    .filter(el => el.textContent.trim() === 'Relationship To You');
outer:
for (const label of labels) {
    const parent = label.parentElement;
    if (!parent) continue;
    for (const child of parent.querySelectorAll('*')) {
        const text = child.textContent.trim();
        const lower = text.toLowerCase();
        if (principals.some(p => lower.includes(p))
            && !text.includes('Relationship To You')
            && !text.includes('Select...')
            && text.length < 50) {
            relationship = text;
            break outer;
        }
    }
}

const checked = [];
for (const cb of document.querySelectorAll('input[type="checkbox"]')) {
    if (!cb.checked) continue;
    const label = cb.closest('label') || cb.parentElement;
    const text = label ? label.textContent.trim() : '';
    if (text) checked.push(text);
}
return { values, relationship, checked };
"#;

/// Responses panel: one entry per event section with listed names and their status codes
pub const RESPONSES: &str = r#"
const sections = [];
for (const section of document.querySelectorAll('.accordion-section')) {
    const header = section.querySelector('h4 span');
    if (!header) continue;
    const body = section.querySelector('.accordion-body');
    const names = body
        ? Array.from(body.querySelectorAll('p.form-control-static')).map(p => p.textContent.trim())
        : [];
    const codes = body
        ? Array.from(body.querySelectorAll('select')).map(s => s.value)
        : [];
    sections.push({ label: header.textContent.trim(), names, codes });
}
return sections;
"#;

/// Click the detail view's close control; false when there is none
pub const CLOSE_BUTTON: &str = r#"
const closeBtn = document.querySelector('.modal-close, .modal-content button.modal-close');
if (closeBtn) {
    closeBtn.click();
    return true;
}
const modal = document.querySelector('.modal-content');
if (modal) {
    for (const btn of modal.querySelectorAll('button')) {
        if (btn.textContent.trim() === '×') {
            btn.click();
            return true;
        }
    }
}
return false;
"#;

pub const SCROLL_TO_END: &str = r#"
window.scrollTo(0, document.body.scrollHeight);
const rows = document.querySelectorAll('table tbody tr');
if (rows.length > 0) rows[rows.length - 1].scrollIntoView({ block: 'end' });
return rows.length;
"#;

pub const SCROLL_TO_TOP: &str = r#"
window.scrollTo(0, 0);
return true;
"#;
