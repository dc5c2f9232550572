pub mod lark;
