//! OpenSSL configuration written into the CA workspace

use std::path::Path;

/// File name of the intermediary CA configuration
pub const INTERMEDIATE_CONFIG_FILE: &str = "int.cnf";

const INTERMEDIATE_CONFIG_HEAD: &str = r#"[ca]
# `man ca`
default_ca                  = CA_default

[ CA_default ]
# Directory and file locations.
dir                         = "#;

const INTERMEDIATE_CONFIG_TAIL: &str = r#"
crl_dir                     = $dir/crl
database                    = $dir/index.txt
serial                      = $dir/serial
new_certs_dir               = $dir/newcerts

# The root key and certificate
private_key                 = $dir/ca.key
certificate                 = $dir/ca.pem

# Certificate Revocation Lists
crl                         = $dir/int_crl.pem
crlnumber                   = $dir/crlnumber
crl_extensions              = crl_ext
default_crl_days            = 30

# Use sha512 instead of sha1
default_md                  = sha512

name_opt                    = ca_default
cert_opt                    = ca_default
default_days                = 375
preserve                    = no
policy                      = policy_loose

[ policy_loose ]
countryName                 = optional
stateOrProvinceName         = optional
localityName                = optional
organizationName            = optional
organizationalUnitName      = optional
commonName                  = supplied
emailAddress                = optional

[ req ]
# Options for the req tool.
default_bits                = 4096
distinguished_name          = req_distinguished_name
string_mask                 = utf8only

default_md                  = sha512

x509_extensions             = v3_ca

[ req_distinguished_name ]
# See https://en.wikipedia.org/wiki/Certificate_signing_request.
countryName                     = Country Name (2 letter code)
stateOrProvinceName             = State or Province Name
localityName                    = Locality Name
0.organizationName              = Organization Name
organizationalUnitName          = Organizational Unit Name
commonName                      = Common Name
emailAddress                    = Email Address

# TODO: defaults

[ v3_ca ]
subjectKeyIdentifier        = hash
authorityKeyIdentifier      = keyid:always,issuer
basicConstraints            = critical, CA:true
keyUsage                    = critical, digitalSignature, cRLSign, keyCertSign

[ v3_intermediate_ca ]
subjectKeyIdentifier        = hash
authorityKeyIdentifier      = keyid:always,issuer
basicConstraints            = critical, CA:true, pathlen:0
keyUsage                    = critical, digitalSignature, cRLSign, keyCertSign

[ usr_cert ]
basicConstraints            = CA:FALSE
nsCertType                  = client, email
nsComment                   = "Client Certificate (Generated by OpenSSL)"
subjectKeyIdentifier        = hash
authorityKeyIdentifier      = keyid,issuer
keyUsage                    = critical, nonRepudiation, digitalSignature, keyEncipherment
extendedKeyUsage            = clientAuth, emailProtection

[ server_cert ]
basicConstraints            = CA:FALSE
nsCertType                  = server
nsComment                   = "Server Certificate (Generated by OpenSSL)"
subjectKeyIdentifier        = hash
authorityKeyIdentifier      = keyid,issuer:always
keyUsage                    = critical, digitalSignature, keyEncipherment
extendedKeyUsage            = serverAuth

[ crl_ext ]
authorityKeyIdentifier      = keyid:always

[ ocsp ]
basicConstraints            = CA:FALSE
subjectKeyIdentifier        = hash
authorityKeyIdentifier      = keyid,issuer
keyUsage                    = critical, digitalSignature
extendedKeyUsage            = critical, OCSPSigning
"#;

/// Render `int.cnf` with `dir` set to the workspace path.
///
/// Everything other than the `dir` value is fixed text read by `openssl ca`.
pub fn intermediate_config(workspace: &Path) -> String {
    format!(
        "{INTERMEDIATE_CONFIG_HEAD}{}{INTERMEDIATE_CONFIG_TAIL}",
        workspace.display()
    )
}
