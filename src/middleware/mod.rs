/*
 * Responsibility
 * - middleware public surface
 */
pub mod cors;
pub mod http;
