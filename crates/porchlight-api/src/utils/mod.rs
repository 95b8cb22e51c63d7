pub mod client_ip;
