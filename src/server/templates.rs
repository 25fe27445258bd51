use handlebars::Handlebars;
use serde::Serialize;

use crate::content::SiteContent;
use crate::infrastructure::error::SiteError;

const INDEX_TEMPLATE: &str = r##"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{{title}}</title>
  <link rel="stylesheet" href="/styles/style.css">
</head>
<body>
  <div id="navbar">
    <div id="brand"><a href="/">{{title}}</a></div>
    <a id="use" href="/editor">Use</a>
  </div>
  <div id="sidebar">
    <div id="section-selector"></div>
    <div id="subsection-selector"></div>
    {{#each sections}}
    <div class="item">
      <a href="#{{slug name}}">{{name}}</a>
      <div class="subitems">
        {{#each subsections}}
        <div class="subitem"><a href="#{{slug this}}">{{this}}</a></div>
        {{/each}}
      </div>
    </div>
    {{/each}}
  </div>
  <div id="content">
    {{#each sections}}
    <div class="section" id="{{slug name}}">
      {{{content}}}
    </div>
    {{/each}}
  </div>
  <div id="editor" style="display: none">
    <select id="language">
      {{#each languages}}
      <option value="{{this}}">{{this}}</option>
      {{/each}}
    </select>
    <button id="compile">Compile</button>
    <button id="download">Download</button>
    <textarea id="format-input"></textarea>
    <ul id="output-nav"></ul>
    <div id="output-views"></div>
  </div>
  <script>window.globals = {{{globals}}};</script>
  <script src="/scripts/setup.js"></script>
</body>
</html>
"##;

const ERROR_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{{status}} {{message}}</title>
</head>
<body>
  <h1>{{message}}</h1>
  <h2>{{status}}</h2>
  {{#if detail}}<pre>{{detail}}</pre>{{/if}}
</body>
</html>
"#;

#[derive(Serialize)]
struct IndexContext<'a> {
    title: &'a str,
    sections: &'a [crate::content::Section],
    languages: &'a [String],
    globals: String,
}

#[derive(Serialize)]
struct ErrorContext<'a> {
    status: u16,
    message: &'a str,
    detail: Option<&'a str>,
}

/// 页面模板引擎
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> Result<Self, SiteError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_helper("slug", Box::new(slug_helper));

        handlebars
            .register_template_string("index", INDEX_TEMPLATE)
            .map_err(|e| SiteError::template(e.to_string()))?;
        handlebars
            .register_template_string("error", ERROR_TEMPLATE)
            .map_err(|e| SiteError::template(e.to_string()))?;

        Ok(Self { handlebars })
    }

    /// 渲染文档页；`/` 与 `/editor` 共用这一页面，编辑器的开关由前端状态决定
    pub fn render_index(&self, title: &str, content: &SiteContent) -> Result<String, SiteError> {
        let context = IndexContext {
            title,
            sections: &content.sections,
            languages: &content.languages,
            globals: serde_json::to_string(&content.globals())
                .map_err(|e| SiteError::template(e.to_string()))?,
        };

        Ok(self.handlebars.render("index", &context)?)
    }

    /// 渲染错误页，`detail` 仅在开发环境下传入
    pub fn render_error(&self, status: u16, message: &str, detail: Option<&str>) -> Result<String, SiteError> {
        let context = ErrorContext { status, message, detail };
        Ok(self.handlebars.render("error", &context)?)
    }
}

/// 把章节名转换成锚点 id
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn slug_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let name = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&slugify(name))?;
    Ok(())
}
