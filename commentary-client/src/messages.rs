/// Every user-visible string of the widget
///
/// Messages ending with a colon get the underlying service message appended verbatim.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Messages {
    pub anonymous: String,

    pub initializing: String,
    pub init_failed: String,
    pub probe_failed: String,

    pub loading: String,
    pub no_comments: String,
    pub load_failed: String,
    pub load_more: String,
    pub retry: String,

    pub empty_content: String,
    /// `{max}` is replaced with the maximum comment length
    pub content_too_long: String,
    pub insert_failed: String,

    pub comment_placeholder: String,
    pub username_placeholder: String,
    pub submit: String,
    pub posting: String,

    pub status_uninitialized: String,
    pub status_connecting: String,
    pub status_connected: String,
    pub status_disconnected: String,
}

impl Messages {
    pub fn english() -> Messages {
        Messages {
            anonymous: String::from("Anonymous"),
            initializing: String::from("Initializing, please retry in a moment..."),
            init_failed: String::from(
                "The comment service could not be initialized, please refresh the page",
            ),
            probe_failed: String::from("Failed connecting to the comment service: "),
            loading: String::from("Loading comments..."),
            no_comments: String::from("No comments yet, be the first to post one!"),
            load_failed: String::from("Failed loading comments: "),
            load_more: String::from("Load more"),
            retry: String::from("Retry"),
            empty_content: String::from("Please enter a comment"),
            content_too_long: String::from("Comments cannot be longer than {max} characters"),
            insert_failed: String::from("Posting failed: "),
            comment_placeholder: String::from("Write a comment..."),
            username_placeholder: String::from("Your name (optional)"),
            submit: String::from("Post comment"),
            posting: String::from("Posting…"),
            status_uninitialized: String::from("Initializing"),
            status_connecting: String::from("Connecting..."),
            status_connected: String::from("Live"),
            status_disconnected: String::from(
                "Offline, new comments will not show up until reconnected",
            ),
        }
    }

    pub fn chinese() -> Messages {
        Messages {
            anonymous: String::from("匿名用户"),
            initializing: String::from("系统初始化中，请稍后重试..."),
            init_failed: String::from("系统配置错误，请刷新页面"),
            probe_failed: String::from("数据库连接失败: "),
            loading: String::from("加载评论中..."),
            no_comments: String::from("还没有评论，快来发表第一条吧！"),
            load_failed: String::from("加载评论失败: "),
            load_more: String::from("加载更多"),
            retry: String::from("重试"),
            empty_content: String::from("请输入评论内容"),
            content_too_long: String::from("评论内容不能超过{max}字"),
            insert_failed: String::from("发布失败: "),
            comment_placeholder: String::from("写下你的评论..."),
            username_placeholder: String::from("你的昵称（可选）"),
            submit: String::from("发布评论"),
            posting: String::from("发布中..."),
            status_uninitialized: String::from("初始化中"),
            status_connecting: String::from("连接中..."),
            status_connected: String::from("实时连接"),
            status_disconnected: String::from("已断开，重新连接前不会显示新评论"),
        }
    }

    /// Pick a bundle from a BCP 47 language tag, falling back to english
    pub fn for_language(tag: &str) -> Messages {
        match tag.split(['-', '_']).next() {
            Some(lang) if lang.eq_ignore_ascii_case("zh") => Messages::chinese(),
            _ => Messages::english(),
        }
    }

    pub fn content_too_long(&self, max: usize) -> String {
        self.content_too_long.replace("{max}", &max.to_string())
    }
}

impl Default for Messages {
    fn default() -> Messages {
        Messages::english()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_selection() {
        assert_eq!(Messages::for_language("zh-CN"), Messages::chinese());
        assert_eq!(Messages::for_language("zh"), Messages::chinese());
        assert_eq!(Messages::for_language("en-US"), Messages::english());
        assert_eq!(Messages::for_language(""), Messages::english());
    }

    #[test]
    fn too_long_mentions_max() {
        assert_eq!(
            Messages::english().content_too_long(500),
            "Comments cannot be longer than 500 characters"
        );
        assert_eq!(Messages::chinese().content_too_long(500), "评论内容不能超过500字");
    }
}
