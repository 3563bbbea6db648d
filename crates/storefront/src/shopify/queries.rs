//! GraphQL documents for the Storefront API.
//!
//! Kept as raw documents rather than build-time codegen; the response shapes
//! live in [`super::types`].

/// List collections with their display metadata.
pub const COLLECTIONS_QUERY: &str = r"
query GetCollections($first: Int!) {
  collections(first: $first) {
    edges {
      node {
        id
        title
        handle
        description
        image {
          url
        }
      }
    }
  }
}
";

/// A collection by handle together with a page of its products.
pub const COLLECTION_PRODUCTS_QUERY: &str = r"
query GetProductsByCollection($handle: String!, $first: Int!) {
  collection(handle: $handle) {
    id
    title
    handle
    description
    image {
      url
    }
    products(first: $first) {
      edges {
        node {
          id
          title
          handle
          availableForSale
          priceRange {
            minVariantPrice {
              amount
              currencyCode
            }
          }
          featuredImage {
            url
          }
          variants(first: 1) {
            edges {
              node {
                id
                title
                availableForSale
                price {
                  amount
                  currencyCode
                }
                selectedOptions {
                  name
                  value
                }
              }
            }
          }
        }
      }
    }
  }
}
";

/// A single product by handle, with all variants and options.
pub const PRODUCT_BY_HANDLE_QUERY: &str = r"
query GetProductByHandle($handle: String!) {
  productByHandle(handle: $handle) {
    id
    title
    description
    handle
    availableForSale
    priceRange {
      minVariantPrice {
        amount
        currencyCode
      }
    }
    featuredImage {
      url
    }
    images(first: 10) {
      edges {
        node {
          url
        }
      }
    }
    variants(first: 50) {
      edges {
        node {
          id
          title
          availableForSale
          price {
            amount
            currencyCode
          }
          selectedOptions {
            name
            value
          }
        }
      }
    }
    options {
      name
      values
    }
  }
}
";

/// Create a cart from line items; the response carries the hosted checkout URL.
pub const CART_CREATE_MUTATION: &str = r"
mutation cartCreate($input: CartInput!) {
  cartCreate(input: $input) {
    cart {
      id
      checkoutUrl
      totalQuantity
      cost {
        totalAmount {
          amount
          currencyCode
        }
      }
    }
    userErrors {
      field
      message
    }
  }
}
";
