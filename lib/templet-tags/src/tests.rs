use std::fs;

use proptest::prelude::*;
use similar_asserts::assert_eq as assert_text_eq;
use templet_core::{Context, Engine, EngineConfiguration, ErrorKind, SafeString, Value};

use super::*;

fn engine() -> Engine {
    engine_with(EngineConfiguration::default())
}

fn engine_with(config: EngineConfiguration) -> Engine {
    let mut engine = Engine::from_configuration(&config);
    register_builtins(&mut engine);
    engine
}

fn mutable_engine() -> Engine {
    let mut engine = engine();
    engine.add_default_library(MUTABLE_TAGS);
    engine
}

fn render(source: &str, ctx: &mut Context) -> String {
    let template = engine().new_template(source, "test");
    assert_eq!(template.error_string(), "", "template failed to compile: {}", source);
    template.render(ctx)
}

fn render_empty(source: &str) -> String {
    render(source, &mut Context::new())
}

fn compile_error(source: &str) -> (ErrorKind, String) {
    let template = engine().new_template(source, "test");
    let kind = template.error().expect("template should have failed to compile");
    (kind, template.error_string())
}

fn names(names: &[&str]) -> Value {
    Value::list(names.iter().copied())
}

#[test]
fn test_if_else() {
    let source = "{% if user %}Hello {{ user }}{% else %}Hi there{% endif %}";
    let mut ctx: Context = [("user", "Ada")].into_iter().collect();
    assert_eq!(render(source, &mut ctx), "Hello Ada");
    assert_eq!(render_empty(source), "Hi there");
}

#[test]
fn test_if_elif_chain() {
    let source = "{% if n > 10 %}big{% elif n > 5 %}medium{% else %}small{% endif %}";
    for (n, expected) in [(20, "big"), (7, "medium"), (1, "small")] {
        let mut ctx: Context = [("n", n)].into_iter().collect();
        assert_eq!(render(source, &mut ctx), expected);
    }
}

#[test]
fn test_if_negative_numbers_are_false() {
    let mut ctx: Context = [("n", -1)].into_iter().collect();
    assert_eq!(render("{% if n %}yes{% else %}no{% endif %}", &mut ctx), "no");
}

#[test]
fn test_if_rejects_mixed_and_or() {
    let (kind, message) = compile_error("{% if a or b and c %}x{% endif %}");
    assert_eq!(kind, ErrorKind::TagSyntax);
    assert!(message.contains("can't mix 'and' and 'or'"), "{}", message);
}

#[test]
fn test_if_requires_a_condition() {
    let (kind, _) = compile_error("{% if %}x{% endif %}");
    assert_eq!(kind, ErrorKind::TagSyntax);
}

#[test]
fn test_unclosed_if_renders_nothing() {
    let template = engine().new_template("before {% if x %}never closed", "unclosed");
    assert_eq!(template.error(), Some(ErrorKind::UnclosedBlockTag));
    assert!(template.error_string().contains("endif"));
    assert_eq!(template.render(&mut Context::new()), "");
}

#[test]
fn test_for_loop_variables() {
    let source = "{% for x in items %}{{ forloop.counter }}:{{ x }}{% if not forloop.last %}, {% endif %}{% endfor %}";
    let mut ctx: Context = [("items", Value::list([1, 2, 3]))].into_iter().collect();
    assert_eq!(render(source, &mut ctx), "1:1, 2:2, 3:3");

    let source = "{% for x in items %}{{ forloop.revcounter0 }}{% if forloop.first %}!{% endif %}{% endfor %}";
    assert_eq!(render(source, &mut ctx), "2!10");
}

#[test]
fn test_for_reversed_and_empty() {
    let mut ctx: Context = [("items", Value::list([1, 2, 3]))].into_iter().collect();
    assert_eq!(render("{% for x in items reversed %}{{ x }}{% endfor %}", &mut ctx), "321");
    assert_eq!(
        render("{% for x in missing %}{{ x }}{% empty %}none{% endfor %}", &mut ctx),
        "none"
    );
    assert_eq!(render("{% for x in missing %}{{ x }}{% endfor %}", &mut ctx), "");
}

#[test]
fn test_for_unpacks_items() {
    let pairs = Value::List(vec![Value::list([Value::from(1), Value::from("a")]), Value::list([Value::from(2)])]);
    let mut ctx: Context = [("pairs", pairs)].into_iter().collect();
    assert_eq!(
        render("{% for n, s in pairs %}{{ n }}={{ s }};{% endfor %}", &mut ctx),
        "1=a;2=;"
    );

    let people = Value::list([
        Value::map([("name", "Ada"), ("lang", "Analytical")]),
        Value::map([("name", "Grace"), ("lang", "COBOL")]),
    ]);
    let mut ctx: Context = [("people", people)].into_iter().collect();
    assert_eq!(
        render("{% for name,lang in people %}{{ name }}/{{ lang }} {% endfor %}", &mut ctx),
        "Ada/Analytical Grace/COBOL "
    );
}

#[test]
fn test_for_over_mapping() {
    let scores = Value::map([("a", 1), ("b", 2)]);
    let mut ctx: Context = [("scores", scores)].into_iter().collect();
    assert_eq!(
        render("{% for k, v in scores %}{{ k }}:{{ v }} {% endfor %}", &mut ctx),
        "a:1 b:2 "
    );
    assert_eq!(
        render("{% for pair in scores %}{{ pair.0 }}{{ pair.1 }}{% endfor %}", &mut ctx),
        "a1b2"
    );
}

#[test]
fn test_nested_for_parentloop() {
    let source = concat!(
        "{% for a in outer %}{% for b in inner %}",
        "{{ forloop.parentloop.counter }}{{ forloop.counter }} ",
        "{% endfor %}{% endfor %}{{ forloop.counter }}"
    );
    let mut ctx: Context = [("outer", names(&["x", "y"])), ("inner", Value::list([1, 2]))]
        .into_iter()
        .collect();
    assert_eq!(render(source, &mut ctx), "11 12 21 22 ");
}

#[test]
fn test_for_syntax_errors() {
    for source in [
        "{% for x %}{% endfor %}",
        "{% for x of items %}{% endfor %}",
        "{% for x y in items %}{% endfor %}",
        "{% for x,,y in items %}{% endfor %}",
    ] {
        let (kind, _) = compile_error(source);
        assert_eq!(kind, ErrorKind::TagSyntax, "{}", source);
    }
}

#[test]
fn test_ifequal_uses_strict_equality() {
    let source = "{% ifequal a 5 %}yes{% else %}no{% endifequal %}";
    let mut ctx: Context = [("a", 5)].into_iter().collect();
    assert_eq!(render(source, &mut ctx), "yes");

    let mut ctx: Context = [("a", "5")].into_iter().collect();
    assert_eq!(render(source, &mut ctx), "no");
    assert_eq!(render("{% ifnotequal a '5' %}differ{% endifnotequal %}", &mut ctx), "");
    assert_eq!(render("{% ifnotequal a 5 %}differ{% endifnotequal %}", &mut ctx), "differ");

    let (kind, message) = compile_error("{% ifequal a %}{% endifequal %}");
    assert_eq!(kind, ErrorKind::TagSyntax);
    assert!(message.starts_with("ifequal tag takes two arguments."));
}

#[test]
fn test_autoescape_and_taint() {
    let mut ctx: Context = [("x", "<b>")].into_iter().collect();
    assert_eq!(render("{{ x }}", &mut ctx), "&lt;b&gt;");
    assert_eq!(render("{{ x|safe }}", &mut ctx), "<b>");
    assert_eq!(render("{{ x|safe|lower }}", &mut ctx), "<b>");
    assert_eq!(
        render("{% autoescape on %}{{ x|safe|upper }}{% endautoescape %}", &mut ctx),
        "&lt;B&gt;"
    );
    assert_eq!(render("{% autoescape off %}{{ x }}{% endautoescape %}", &mut ctx), "<b>");
    assert_eq!(
        render("{% autoescape off %}{{ x|escape }}{% endautoescape %}", &mut ctx),
        "&lt;b&gt;"
    );
    assert_eq!(render("{{ x|force_escape }}", &mut ctx), "&lt;b&gt;");
    assert_eq!(render("{% autoescape off %}{% endautoescape %}{{ x }}", &mut ctx), "&lt;b&gt;");
}

#[test]
fn test_autoescape_argument_errors() {
    let (_, message) = compile_error("{% autoescape maybe %}{% endautoescape %}");
    assert!(message.contains("argument must be 'on' or 'off'"));
    let (kind, _) = compile_error("{% autoescape %}{% endautoescape %}");
    assert_eq!(kind, ErrorKind::TagSyntax);
}

#[test]
fn test_filter_tag() {
    let mut ctx: Context = [("name", "<ADA>")].into_iter().collect();
    assert_eq!(
        render("{% filter lower %}Hello {{ name }}{% endfilter %}", &mut ctx),
        "hello &lt;ada&gt;"
    );
    assert_eq!(
        render("{% filter cut:\" \"|capfirst %}a b c{% endfilter %}", &mut ctx),
        "Abc"
    );

    assert_eq!(
        render("{% filter upper %}<p>hi {{ name }}</p>{% endfilter %}", &mut ctx),
        "<P>HI &LT;ADA&GT;</P>"
    );

    for source in ["{% filter safe %}x{% endfilter %}", "{% filter lower|escape %}x{% endfilter %}"] {
        let (kind, message) = compile_error(source);
        assert_eq!(kind, ErrorKind::TagSyntax);
        assert!(message.contains("autoescape"), "{}", message);
    }
}

#[test]
fn test_with() {
    let user = Value::map([("name", "Ada")]);
    let mut ctx: Context = [("user", user)].into_iter().collect();
    assert_eq!(
        render("{% with user.name as who %}{{ who }}{% endwith %}[{{ who }}]", &mut ctx),
        "Ada[]"
    );
    assert_eq!(
        render("{% with a=1 b='two' %}{{ a }}{{ b }}{% endwith %}", &mut ctx),
        "1two"
    );

    let (_, message) = compile_error("{% with user.name %}{% endwith %}");
    assert!(message.contains("expected format is 'name=value' or 'value as name'"));
}

#[test]
fn test_cycle() {
    let mut ctx: Context = [("items", Value::list([1, 2, 3]))].into_iter().collect();
    let template = engine().new_template("{% for x in items %}{% cycle 'odd' 'even' %} {% endfor %}", "cycle");

    // Each render starts the cycle over.
    assert_eq!(template.render(&mut ctx), "odd even odd ");
    assert_eq!(template.render(&mut ctx), "odd even odd ");

    assert_eq!(render("{% for x in items %}{% cycle a,b %}{% endfor %}", &mut ctx), "aba");
}

#[test]
fn test_named_cycle() {
    let mut ctx: Context = [("items", Value::list([1, 2]))].into_iter().collect();
    assert_eq!(
        render("{% for x in items %}{% cycle 'a' 'b' as c %}{{ c }}{% endfor %}", &mut ctx),
        "aabb"
    );
    assert_eq!(
        render("{% cycle 'x' 'y' as c %}{% cycle c %}{% cycle c %}", &mut ctx),
        "xyx"
    );

    let (_, message) = compile_error("{% cycle c %}");
    assert!(message.contains("No named cycles in template. 'c' is not defined"));
    let (_, message) = compile_error("{% cycle 'x' 'y' as c %}{% cycle d %}");
    assert!(message.contains("Node not found"));
}

#[test]
fn test_firstof() {
    let mut ctx: Context = [("a", Value::from("")), ("b", Value::from("<B>"))].into_iter().collect();
    assert_eq!(render("{% firstof a b 'fallback' %}", &mut ctx), "&lt;B&gt;");
    assert_eq!(render_empty("{% firstof a b 'fallback' %}"), "fallback");
    assert_eq!(render_empty("{% firstof a b %}"), "");

    let (kind, _) = compile_error("{% firstof %}");
    assert_eq!(kind, ErrorKind::TagSyntax);
}

#[test]
fn test_templatetag() {
    assert_eq!(
        render_empty("{% templatetag openblock %} x {% templatetag closeblock %}"),
        "{% x %}"
    );
    assert_eq!(
        render_empty("{% templatetag openvariable %}{% templatetag closevariable %}{% templatetag opencomment %}"),
        "{{}}{#"
    );

    let (_, message) = compile_error("{% templatetag bogus %}");
    assert!(message.contains("Not a template tag"));
    let (_, message) = compile_error("{% templatetag %}");
    assert!(message.contains("'templatetag' statement takes one argument"));
}

#[test]
fn test_spaceless_and_comment() {
    assert_eq!(
        render_empty("{% spaceless %}\n<p>\n  <a>x</a>\n</p>\n{% endspaceless %}"),
        "<p><a>x</a></p>"
    );
    assert_eq!(render_empty("a{% comment %}{% if %}ignored{% endcomment %}b"), "ab");

    let (kind, _) = compile_error("a{% comment %}never closed");
    assert_eq!(kind, ErrorKind::UnclosedBlockTag);
}

#[test]
fn test_load() {
    assert_eq!(render_empty("{% load mutable_tags %}{% raw %}x{% endraw %}"), "x");

    let (kind, message) = compile_error("{% load nope %}");
    assert_eq!(kind, ErrorKind::TagSyntax);
    assert!(message.contains("'nope' is not a valid tag library."));

    // Tags from a library only exist after it is loaded.
    let template = engine().new_template("{% raw %}x{% endraw %}", "unloaded");
    assert_eq!(template.error(), Some(ErrorKind::InvalidBlockTag));
}

#[test]
fn test_media_finder() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("img")).unwrap();
    fs::write(dir.path().join("img").join("logo.png"), [0u8; 4]).unwrap();

    let engine = engine_with(EngineConfiguration {
        media_dirs: vec![dir.path().to_path_buf()],
        ..EngineConfiguration::default()
    });
    let template = engine.new_template("<img src=\"{% media_finder missing 'img/logo.png' %}\">", "media");

    let mut ctx = Context::new();
    let output = template.render(&mut ctx);
    let base = fs::canonicalize(dir.path()).unwrap();
    assert_eq!(output, format!("<img src=\"file://{}/img/logo.png\">", base.display()));

    let media = ctx.external_media();
    assert_eq!(media.len(), 1);
    assert_eq!(media[0].uri, format!("file://{}/", base.display()));
    assert_eq!(media[0].file_name, "img/logo.png");

    assert_eq!(engine.new_template("{% media_finder 'nope.png' %}", "none").render(&mut ctx), "");
}

#[test]
fn test_filters() {
    let mut ctx: Context = [
        ("items", names(&["<a>", "b"])),
        ("name", Value::from("ada lovelace")),
        ("flag", Value::from(true)),
    ]
    .into_iter()
    .collect();

    assert_eq!(render("{{ items|join:\", \" }}", &mut ctx), "&lt;a&gt;, b");
    assert_eq!(
        render("{% autoescape off %}{{ items|join:\", \" }}{% endautoescape %}", &mut ctx),
        "<a>, b"
    );
    assert_eq!(render("{{ items|length }}", &mut ctx), "2");
    assert_eq!(render("{{ items|last }}", &mut ctx), "b");
    assert_eq!(render("{{ name|title }}", &mut ctx), "Ada Lovelace");
    assert_eq!(render("{{ name|capfirst }}", &mut ctx), "Ada lovelace");
    assert_eq!(render("{{ missing|default:'none' }}", &mut ctx), "none");
    assert_eq!(render("{{ missing|default_if_none:'none' }}", &mut ctx), "none");
    assert_eq!(render("{{ flag|yesno:'on,off' }}", &mut ctx), "on");
    assert_eq!(render("{{ name|addslashes }}", &mut ctx), "ada lovelace");
}

#[test]
fn test_unknown_filter_fails_compile() {
    let (kind, message) = compile_error("{{ x|frobnicate }}");
    assert_eq!(kind, ErrorKind::TagSyntax);
    assert!(message.contains("frobnicate"));
}

#[test]
fn test_filter_accepts_one_argument() {
    let (kind, message) = compile_error("{{ x|default:'a':'b' }}");
    assert_eq!(kind, ErrorKind::TagSyntax);
    assert!(message.contains("takes at most one argument"), "{}", message);
}

#[test]
fn test_string_literals_may_hold_underscores() {
    assert_eq!(render_empty("{{ \"a._b\" }}|{{ '_c'|upper }}"), "a._b|_C");
    let (_, message) = compile_error("{{ a._b }}");
    assert!(message.contains("underscores"));
}

#[test]
fn test_smart_trim_page() {
    let engine = engine_with(EngineConfiguration {
        smart_trim: true,
        ..EngineConfiguration::default()
    });
    let source = "<ul>\n  {% for x in items %}\n  <li>{{ x }}</li>\n  {% endfor %}\n</ul>\n";
    let mut ctx: Context = [("items", Value::list([1, 2]))].into_iter().collect();

    let output = engine.new_template(source, "page").render(&mut ctx);
    assert_text_eq!(output, "<ul>\n  <li>1</li>\n  <li>2</li>\n</ul>\n");
}

#[test]
fn test_raw_tag_in_mutable_template() {
    let engine = mutable_engine();
    let mut template = engine.new_mutable_template("Begin{% raw %} Stuff {% endraw %}Afters.", "raw");

    let mut ctx: Context = [("var", "Far")].into_iter().collect();
    assert_eq!(template.render(&mut ctx), "Begin Stuff Afters.");
    let mut ctx: Context = [("var", "SPAM")].into_iter().collect();
    assert_eq!(template.render(&mut ctx), "Begin Stuff Afters.");
}

#[test]
fn test_raw_tag_is_re_evaluated() {
    let engine = mutable_engine();
    let mut template = engine.new_mutable_template(
        concat!(
            "Begin {% for name in nameList %}{{ name }},{% endfor %}",
            "{% raw %}{% for name in nameList %}{{ name }},{% endfor %} var: {{ var }}. {% endraw %}",
            "Afters."
        ),
        "raw",
    );

    let passes = [
        ("Far", ["Tom", "Dick", "Harry"], "Begin Tom,Dick,Harry,Tom,Dick,Harry, var: Far. Afters."),
        ("SPAM", ["Larry", "Moe", "Curly"], "Begin Tom,Dick,Harry,Larry,Moe,Curly, var: SPAM. Afters."),
        ("EGGS", ["John", "Michael", "Terry"], "Begin Tom,Dick,Harry,John,Michael,Terry, var: EGGS. Afters."),
    ];
    for (var, name_list, expected) in passes {
        let mut ctx: Context = [("var", Value::from(var)), ("nameList", names(&name_list))]
            .into_iter()
            .collect();
        assert_eq!(template.render(&mut ctx), expected);
        assert!(template.error().is_none());
    }
}

#[test]
fn test_repeater_accumulates_output() {
    let engine = mutable_engine();
    let mut template = engine.new_mutable_template(
        concat!(
            "{% for name in nameList %}{{ name }},{% endfor %}",
            "{% repeater %}{% for name in nameList %}{{ name }},{% endfor %} var: {{ var }}. {% endrepeater %}",
            "Afters"
        ),
        "repeater",
    );

    let mut expected = String::from("Tom,Dick,Harry,");
    let passes = [
        ("Far", ["Tom", "Dick", "Harry"]),
        ("SPAM", ["Larry", "Moe", "Curly"]),
        ("EGGS", ["John", "Michael", "Terry"]),
    ];
    for (var, name_list) in passes {
        let mut ctx: Context = [("var", Value::from(var)), ("nameList", names(&name_list))]
            .into_iter()
            .collect();
        expected.push_str(&format!("{}, var: {}. ", name_list.join(","), var));
        assert_text_eq!(template.render(&mut ctx), format!("{}Afters", expected));
    }
}

#[test]
fn test_multiple_repeaters() {
    let engine = mutable_engine();
    let mut template = engine.new_mutable_template(
        "Before.{% repeater %}Foo.{% endrepeater %}Middle.{% repeater %}Bar.{% endrepeater %}After.",
        "multi",
    );
    assert_eq!(template.render(&mut Context::new()), "Before.Foo.Middle.Bar.After.");

    let mut template = engine.new_mutable_template(
        "Before.{% repeater %}Foo.{% endrepeater %}Middle.{{ var }}.{% repeater %}Bar.{% endrepeater %}After.",
        "multi",
    );
    let mut ctx: Context = [("var", "String")].into_iter().collect();
    assert_eq!(template.render(&mut ctx), "Before.Foo.Middle.String.Bar.After.");
}

#[test]
fn test_mutable_template_converges() {
    let engine = mutable_engine();
    let source = "Hello {{ name }}{% for x in items %}{{ x }}{% endfor %}{% if name %}!{% endif %}";
    let mut first: Context = [("name", Value::from("Ada")), ("items", Value::list([1, 2]))]
        .into_iter()
        .collect();

    let expected = engine.new_template(source, "immutable").render(&mut first);
    let mut template = engine.new_mutable_template(source, "mutable");
    let initial = template.node_count();

    assert_eq!(template.render(&mut first), expected);
    let after_first = template.node_count();
    assert!(after_first < initial);

    let mut second: Context = [("name", Value::from("Grace")), ("items", Value::list([3]))]
        .into_iter()
        .collect();
    assert_eq!(template.render(&mut second), expected);
    assert_eq!(template.node_count(), after_first);
}

#[test]
fn test_safe_values_from_context() {
    let mut ctx: Context = [("html", SafeString::safe("<i>ok</i>"))].into_iter().collect();
    assert_eq!(render("{{ html }}", &mut ctx), "<i>ok</i>");
    assert_eq!(render("{{ html|upper }}", &mut ctx), "&lt;I&gt;OK&lt;/I&gt;");
}

proptest! {
    #[test]
    fn property_for_visits_every_item(items in proptest::collection::vec(any::<i64>(), 0..16)) {
        let mut ctx: Context = [("items", Value::list(items.iter().copied()))].into_iter().collect();
        let expected = items.iter().map(|i| format!("{},", i)).collect::<String>();
        prop_assert_eq!(render("{% for x in items %}{{ x }},{% endfor %}", &mut ctx), expected);

        let reversed = items.iter().rev().map(|i| format!("{},", i)).collect::<String>();
        prop_assert_eq!(render("{% for x in items reversed %}{{ x }},{% endfor %}", &mut ctx), reversed);
    }

    #[test]
    fn property_autoescape_off_writes_text_verbatim(s in "[a-z<>&\"' ]{0,24}") {
        let mut ctx: Context = [("s", s.as_str())].into_iter().collect();
        prop_assert_eq!(render("{% autoescape off %}{{ s|lower }}{% endautoescape %}", &mut ctx), s.to_lowercase());
    }
}
