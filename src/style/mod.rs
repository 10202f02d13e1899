//! Cascade resolution.
//!
//! This module contains:
//! - [`Resolver`] gathering `<style>`, linked and supplied stylesheets
//! - the cascade itself
//! - [`ComputedStyle`] and [`ResolvedStyles`] for querying results

mod cascade;
mod computed;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

use selectors::context::SelectorCaches;
use url::Url;

pub use computed::{CascadedValue, ComputedStyle, ValueOrigin};

use crate::css::values::extract_urls;
use crate::css::{StylesheetCache, Stylesheet};
use crate::dom::{Document, ElementRef, NodeId};
use crate::error::{Error, Result};
use crate::resource::{ResourceLoader, resolve_reference};

/// What the resolver applies besides the supplied stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Location of the document; relative `href`s and `url()`s resolve
    /// against it.
    pub base_url: Option<Url>,
    /// Apply `<style>` elements.
    pub apply_style_tags: bool,
    /// Load and apply `<link rel="stylesheet">` targets (needs a loader).
    pub apply_link_tags: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            apply_style_tags: true,
            apply_link_tags: false,
        }
    }
}

impl ResolveOptions {
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    pub fn with_link_tags(mut self, apply: bool) -> Self {
        self.apply_link_tags = apply;
        self
    }

    pub fn with_style_tags(mut self, apply: bool) -> Self {
        self.apply_style_tags = apply;
        self
    }
}

/// A stylesheet that took part in resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSource {
    /// `<style> #1`, a URL, or `stylesheet` for the supplied sheet.
    pub label: String,
    /// Base for `url()` references declared in this sheet.
    pub base: Option<Url>,
    pub rules: usize,
}

enum SheetRef<'s> {
    Shared(Arc<Stylesheet>),
    Borrowed(&'s Stylesheet),
}

impl Deref for SheetRef<'_> {
    type Target = Stylesheet;

    fn deref(&self) -> &Stylesheet {
        match self {
            Self::Shared(sheet) => sheet,
            Self::Borrowed(sheet) => sheet,
        }
    }
}

/// Computes effective styles for every element of a document.
pub struct Resolver<'a> {
    options: ResolveOptions,
    loader: Option<&'a dyn ResourceLoader>,
    cache: Option<&'a StylesheetCache>,
}

impl<'a> Resolver<'a> {
    pub fn new(options: ResolveOptions) -> Self {
        Self {
            options,
            loader: None,
            cache: None,
        }
    }

    /// Loader for `<link>` and `@import` targets. Without one, they are
    /// skipped.
    pub fn with_loader(mut self, loader: &'a dyn ResourceLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Reuse parsed stylesheets across runs.
    pub fn with_cache(mut self, cache: &'a StylesheetCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve `document` with `stylesheet` applied after the document's own
    /// stylesheets.
    pub fn resolve<'d>(
        &self,
        document: &'d Document,
        stylesheet: &Stylesheet,
    ) -> Result<ResolvedStyles<'d>> {
        let span = tracing::debug_span!("resolve", nodes = document.len());
        let _enter = span.enter();

        let mut sheets = Vec::new();
        let mut chain = Vec::new();
        let base = self.options.base_url.as_ref();

        let mut style_tags = 0;
        for id in document.elements() {
            let Some(name) = document.element_name(id) else {
                continue;
            };
            match &**name {
                "style" if self.options.apply_style_tags => {
                    style_tags += 1;
                    let label = format!("<style> #{style_tags}");
                    let sheet = self
                        .parse(&document.text_content(id))
                        .map_err(|e| e.in_source(&label))?;
                    let source = StyleSource {
                        label,
                        base: base.cloned(),
                        rules: sheet.rules().len(),
                    };
                    self.collect(SheetRef::Shared(sheet), source, &mut chain, &mut sheets)?;
                }
                "link" if self.options.apply_link_tags && document.is_stylesheet_link(id) => {
                    if let Some(href) = document.attr(id, "href") {
                        let url = resolve_reference(base, href)?;
                        self.load_linked(url, &mut chain, &mut sheets)?;
                    }
                }
                _ => {}
            }
        }

        let source = StyleSource {
            label: "stylesheet".to_string(),
            base: base.cloned(),
            rules: stylesheet.rules().len(),
        };
        self.collect(SheetRef::Borrowed(stylesheet), source, &mut chain, &mut sheets)?;

        for (_, source) in &sheets {
            tracing::debug!(source = %source.label, rules = source.rules, "applying stylesheet");
        }

        let sheet_refs: Vec<&Stylesheet> = sheets.iter().map(|(sheet, _)| &**sheet).collect();
        let mut caches = SelectorCaches::default();
        let mut styles = BTreeMap::new();
        for id in document.elements() {
            let inline = match document.attr(id, "style") {
                Some(text) => Stylesheet::parse_inline(text).map_err(|e| {
                    let tag = document.element_name(id).map(|n| n.to_string());
                    Error::in_source(
                        e,
                        &format!("style attribute of <{}>", tag.unwrap_or_default()),
                    )
                })?,
                None => Vec::new(),
            };
            let style = cascade::cascade_element(
                ElementRef::new(document, id),
                &sheet_refs,
                &inline,
                &mut caches,
            );
            styles.insert(id, style);
        }

        tracing::debug!(
            elements = styles.len(),
            sources = sheets.len(),
            "resolved styles"
        );

        Ok(ResolvedStyles {
            document,
            styles,
            sources: sheets.into_iter().map(|(_, source)| source).collect(),
            base_url: self.options.base_url.clone(),
        })
    }

    fn parse(&self, css: &str) -> Result<Arc<Stylesheet>> {
        match self.cache {
            Some(cache) => cache.get_or_parse(css),
            None => Stylesheet::parse(css).map(Arc::new),
        }
    }

    /// Push `sheet` after the sheets it imports.
    fn collect<'s>(
        &self,
        sheet: SheetRef<'s>,
        source: StyleSource,
        chain: &mut Vec<Url>,
        out: &mut Vec<(SheetRef<'s>, StyleSource)>,
    ) -> Result<()> {
        for href in sheet.imports() {
            if self.loader.is_none() {
                tracing::warn!(%href, source = %source.label, "@import skipped: no resource loader");
                continue;
            }
            let url = resolve_reference(source.base.as_ref(), &href)?;
            self.load_linked(url, chain, out)?;
        }
        out.push((sheet, source));
        Ok(())
    }

    fn load_linked<'s>(
        &self,
        url: Url,
        chain: &mut Vec<Url>,
        out: &mut Vec<(SheetRef<'s>, StyleSource)>,
    ) -> Result<()> {
        if chain.contains(&url) {
            let path: Vec<&str> = chain.iter().map(Url::as_str).collect();
            return Err(Error::Resolution(format!(
                "cyclic @import: {} -> {url}",
                path.join(" -> ")
            )));
        }
        let Some(loader) = self.loader else {
            tracing::warn!(%url, "linked stylesheet skipped: no resource loader");
            return Ok(());
        };
        let Some(css) = loader.load(&url)? else {
            tracing::warn!(%url, "linked stylesheet skipped: location not supported by loader");
            return Ok(());
        };

        let label = url.to_string();
        let sheet = self.parse(&css).map_err(|e| e.in_source(&label))?;
        let source = StyleSource {
            label,
            base: Some(url.clone()),
            rules: sheet.rules().len(),
        };

        chain.push(url);
        let result = self.collect(SheetRef::Shared(sheet), source, chain, out);
        chain.pop();
        result
    }
}

/// Resolve with default options: `<style>` elements and the supplied sheet,
/// no linked stylesheets.
pub fn resolve<'d>(document: &'d Document, stylesheet: &Stylesheet) -> Result<ResolvedStyles<'d>> {
    Resolver::new(ResolveOptions::default()).resolve(document, stylesheet)
}

/// Cascaded styles of every element of a document.
#[derive(Debug)]
pub struct ResolvedStyles<'d> {
    document: &'d Document,
    styles: BTreeMap<NodeId, ComputedStyle>,
    sources: Vec<StyleSource>,
    base_url: Option<Url>,
}

impl<'d> ResolvedStyles<'d> {
    pub fn document(&self) -> &'d Document {
        self.document
    }

    /// Stylesheets in cascade order.
    pub fn sources(&self) -> &[StyleSource] {
        &self.sources
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Elements matching a static selector, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.document.select(selector)
    }

    pub fn style(&self, element: NodeId) -> Option<&ComputedStyle> {
        self.styles.get(&element)
    }

    pub fn value(&self, element: NodeId, property: &str) -> Option<Cow<'_, str>> {
        self.style(element)?.get(property)
    }

    /// Value of `property` on the first element matching `selector`.
    ///
    /// `Ok(None)` when nothing matches or the property is not set.
    pub fn effective_value(&self, selector: &str, property: &str) -> Result<Option<String>> {
        let elements = self.select(selector)?;
        Ok(elements
            .first()
            .and_then(|&id| self.value(id, property))
            .map(Cow::into_owned))
    }

    /// `url()` references in the cascaded value, resolved against the
    /// location of the sheet that declared it.
    pub fn resource_urls(&self, element: NodeId, property: &str) -> Result<Vec<Url>> {
        let Some(style) = self.style(element) else {
            return Ok(Vec::new());
        };
        let Some(value) = style.get(property) else {
            return Ok(Vec::new());
        };
        let base = match style.cascaded(property).map(|v| &v.origin) {
            Some(ValueOrigin::Rule { sheet, .. }) => self
                .sources
                .get(*sheet)
                .and_then(|s| s.base.as_ref())
                .or(self.base_url.as_ref()),
            _ => self.base_url.as_ref(),
        };
        extract_urls(&value)
            .iter()
            .map(|href| resolve_reference(base, href))
            .collect()
    }
}
