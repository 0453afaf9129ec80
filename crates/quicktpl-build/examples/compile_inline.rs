// SPDX-License-Identifier: Apache-2.0 OR MIT
use quicktpl_build::{compile_with_options, CompileOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let template = r#"Rows of a table.

{% func Table(rows []string) %}
<table>
{% for i, row := range rows %}
	{% if i > 10 %}{% break %}{% endif %}
	<tr><td>{% d i %}</td><td>{% s row %}</td></tr>
{% endfor %}
</table>
{% endfunc %}
"#;

    let options = CompileOptions::default().with_runtime_package("qt");
    let generated = compile_with_options(Vec::new(), template, "table.qtpl", &options)?;
    print!("{}", String::from_utf8(generated)?);
    Ok(())
}
