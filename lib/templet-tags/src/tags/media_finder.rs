use std::{fmt, sync::Arc};

use templet_core::{
    loader::TemplateLoader, node::write_value, parser::smart_split, Context, FilterExpression, Node, NodeFactory,
    OutputStream, Parser, TemplateError, Value,
};

/// Parses `{% media_finder a b %}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MediaFinderFactory;

impl NodeFactory for MediaFinderFactory {
    fn get_node(&self, tag_content: &str, parser: &mut Parser<'_>) -> Result<Box<dyn Node>, TemplateError> {
        let words = smart_split(tag_content);
        if words.len() < 2 {
            return Err(TemplateError::syntax("'media_finder' tag requires at least one argument"));
        }

        let candidates = words[1..]
            .iter()
            .map(|word| FilterExpression::parse(word, parser))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::new(MediaFinderNode {
            candidates,
            loaders: parser.engine().loaders().to_vec(),
        }))
    }
}

/// Outputs the URI of the first of its arguments that names a media file known to the engine's loaders.
///
/// The file is also recorded on the context as external media.
pub struct MediaFinderNode {
    candidates: Vec<FilterExpression>,
    loaders: Vec<Arc<dyn TemplateLoader>>,
}

impl MediaFinderNode {
    fn media_uri(&self, file_name: &str) -> Option<(String, String)> {
        self.loaders.iter().find_map(|loader| loader.media_uri(file_name))
    }
}

impl Node for MediaFinderNode {
    fn render(&self, out: &mut OutputStream<'_>, ctx: &mut Context) -> Result<(), TemplateError> {
        for candidate in &self.candidates {
            let value = candidate.resolve(ctx);
            if !value.is_true() {
                continue;
            }

            let Some((base, file_name)) = self.media_uri(value.to_safe_string().as_str()) else {
                continue;
            };
            let uri = format!("file://{}", base);
            ctx.add_external_media(uri.as_str(), file_name.as_str());
            write_value(&Value::from(uri), out, ctx)?;
            return write_value(&Value::from(file_name), out, ctx);
        }
        Ok(())
    }
}

impl fmt::Debug for MediaFinderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFinderNode")
            .field("candidates", &self.candidates)
            .field("loaders", &self.loaders.len())
            .finish()
    }
}
