//! Browser-side JavaScript used by the crawler (C2) to DOM-query assets,
//! approximate CSS coverage, and catalog interactive elements before they
//! are replayed as baseline behaviors.
//!
//! Adapted from the page_extractor module's `RESOURCES_SCRIPT` /
//! `INTERACTIVE_ELEMENTS_SCRIPT`, trimmed to what the spec's `SiteInventory`
//! actually needs (no metadata/timing/security extraction).

/// Discover every asset the page actually loaded: image/css/js/font URLs
/// pulled from the DOM (spec §4.2 step 2: "DOM-query assets (img/link/script/source)").
pub const ASSET_DISCOVERY_SCRIPT: &str = r#"
    (() => {
        const urls = new Set();
        document.querySelectorAll('img[src]').forEach(el => urls.add(el.src));
        document.querySelectorAll('source[src]').forEach(el => urls.add(el.src));
        document.querySelectorAll('link[rel="stylesheet"][href]').forEach(el => urls.add(el.href));
        document.querySelectorAll('script[src]').forEach(el => urls.add(el.src));
        document.querySelectorAll('link[rel="preload"][as="font"]').forEach(el => urls.add(el.href));
        return Array.from(urls).filter(u => u.startsWith('http'));
    })()
"#;

/// Whether jQuery is present on `window`, plus the external script URLs this
/// page loads alongside it. Exact dependency analysis would need static
/// analysis of each script's body; this records the jQuery-using page's own
/// script set as a conservative "potentially dependent" list, which is what
/// the HTML rewriter's script-reordering pass (spec §4.4) needs to stay safe.
pub const JQUERY_USAGE_SCRIPT: &str = r#"
    (() => {
        const usesJquery = typeof window.jQuery !== 'undefined' || typeof window.$ !== 'undefined';
        const scripts = Array.from(document.querySelectorAll('script[src]'))
            .map(el => el.src)
            .filter(src => src.startsWith('http') && !/jquery/i.test(src));
        return { usesJquery, scripts: usesJquery ? scripts : [] };
    })()
"#;

/// Approximate CSS coverage: for every rule in every same-origin stylesheet,
/// report its selector text if it currently matches something in the DOM.
/// This is a static-match approximation rather than true runtime coverage
/// (spec §4.2 step 2's "capture coverage"), but it is deterministic given
/// the same DOM, which is the guarantee the crawler actually promises.
pub const CSS_COVERAGE_SCRIPT: &str = r#"
    (() => {
        const used = new Set();
        for (const sheet of Array.from(document.styleSheets)) {
            let rules;
            try {
                rules = sheet.cssRules;
            } catch (e) {
                continue; // cross-origin stylesheet, can't inspect
            }
            if (!rules) continue;
            for (const rule of Array.from(rules)) {
                if (!rule.selectorText) continue;
                for (const selector of rule.selectorText.split(',')) {
                    const trimmed = selector.trim();
                    if (!trimmed) continue;
                    try {
                        if (document.querySelector(trimmed)) {
                            used.add(trimmed);
                        }
                    } catch (e) {
                        // not a valid querySelector (e.g. ::before) - skip
                    }
                }
            }
        }
        return Array.from(used);
    })()
"#;

/// Build a stable CSS selector path for an element: tag names with
/// nth-of-type indices from `body` down. Used so the same selector can be
/// re-queried after a probe click to diff class/visibility state.
const SELECTOR_PATH_HELPER: &str = r#"
        function selectorPath(el) {
            const parts = [];
            let node = el;
            while (node && node !== document.body && node.parentElement) {
                const siblings = Array.from(node.parentElement.children).filter(s => s.tagName === node.tagName);
                const index = siblings.indexOf(node) + 1;
                parts.unshift(`${node.tagName.toLowerCase()}:nth-of-type(${index})`);
                node = node.parentElement;
            }
            return 'body > ' + parts.join(' > ');
        }
"#;

/// Candidate interactive elements for baseline-behavior probing: forms,
/// buttons, anchors, and elements bearing modal/dropdown/slider class hints
/// (spec §4.2 step 2's "scripted catalog of interactive probes"). Bounded to
/// the first 25 matches so a single page can't make the crawl unbounded.
pub fn candidates_script() -> String {
    format!(
        r#"
    (() => {{
        {helper}
        const selector = [
            'form', 'button', 'a[href]',
            '[class*="modal"]', '[class*="dropdown"]', '[class*="slider"]',
            '[class*="accordion"]', '[class*="toggle"]', '[class*="tab"]'
        ].join(', ');
        const seen = new Set();
        const out = [];
        for (const el of document.querySelectorAll(selector)) {{
            if (out.length >= 25) break;
            const path = selectorPath(el);
            if (seen.has(path)) continue;
            seen.add(path);
            const tag = el.tagName.toLowerCase();
            const kind = tag === 'form' ? 'form'
                : el.className && /modal/i.test(el.className) ? 'modal'
                : el.className && /dropdown/i.test(el.className) ? 'dropdown'
                : el.className && /slider/i.test(el.className) ? 'slider'
                : tag === 'a' ? 'link'
                : 'button';
            const action = tag === 'form' ? 'submit' : 'click';
            out.push({{ selector: path, kind, action }});
        }}
        return out;
    }})()
"#,
        helper = SELECTOR_PATH_HELPER
    )
}

/// Snapshot the `className` and bounding-box visibility of every element the
/// candidate-probe pass found, keyed by the same selector path, so a
/// before/after diff can detect class-appears / becomes-visible behaviors.
pub fn snapshot_script(selectors: &[String]) -> String {
    let selector_list = serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"
    (() => {{
        const selectors = {selectors};
        const out = {{}};
        for (const sel of selectors) {{
            const el = document.querySelector(sel);
            if (!el) continue;
            const rect = el.getBoundingClientRect();
            out[sel] = {{
                className: el.className || '',
                visible: rect.width > 0 && rect.height > 0,
            }};
        }}
        return out;
    }})()
"#,
        selectors = selector_list
    )
}

/// Click or submit the element at `selector`. Errors are swallowed in JS and
/// surfaced as `ok: false` so one bad probe doesn't abort the page crawl.
pub fn trigger_script(selector: &str, action: &str) -> String {
    let selector_json = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    let method = if action == "submit" { "requestSubmit" } else { "click" };
    format!(
        r#"
    (() => {{
        try {{
            const el = document.querySelector({selector});
            if (!el) return {{ ok: false }};
            if (typeof el.{method} === 'function') {{
                el.{method}();
            }} else {{
                el.click();
            }}
            return {{ ok: true, url: window.location.href }};
        }} catch (e) {{
            return {{ ok: false }};
        }}
    }})()
"#,
        selector = selector_json,
        method = method
    )
}
